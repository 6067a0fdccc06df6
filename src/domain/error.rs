//! # Error Taxonomy
//!
//! Typed failures for each stage of a dispatch. All of these are local to a
//! single event; none of them may take down the dispatch loop.

use std::time::Duration;
use thiserror::Error;

/// The transport handed us something we cannot build a canonical event from.
/// Dropped by the dispatcher, logged at debug, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("malformed transport event: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Optimistic commit lost a race: the caller's snapshot version no longer
    /// matches. Nothing was written.
    #[error("stale session version for {conversation_id}: expected {expected}, found {current}")]
    Conflict {
        conversation_id: String,
        expected: u64,
        current: u64,
    },
    /// The session was evicted between snapshot and commit. A commit never
    /// recreates an evicted session.
    #[error("no session for conversation {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),
    #[error("handler panicked")]
    Panicked,
    #[error("handler failed: {0}")]
    Failed(String),
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Surfaced to the delivery loop, which owns retry policy. The core itself
/// never retries a delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no deliverable conversation {0}")]
    UnknownConversation(String),
    #[error("transport send failed: {0}")]
    Send(String),
}
