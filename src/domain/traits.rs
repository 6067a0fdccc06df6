//! # Domain Traits
//!
//! Abstract interfaces for the pluggable edges of the core: handlers on the
//! inside, transports on the outside. Implementations live in the Interface
//! and Infrastructure layers.

use async_trait::async_trait;

use crate::domain::error::{DeliveryError, HandlerError};
use crate::domain::types::{Action, Event, Outcome, SessionView};

/// A registered capability. Command handlers are resolved by token through
/// the router; text handlers opt in via `matches`.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Predicate consulted for non-command events, in registration order.
    /// Defaults to "not interested".
    fn matches(&self, _event: &Event) -> bool {
        false
    }

    /// Process one event against a session snapshot. The view must not be
    /// retained beyond this call; state changes go into `Outcome::mutation`.
    async fn invoke(&self, event: &Event, session: SessionView) -> Result<Outcome, HandlerError>;
}

/// Outbound edge to a messaging platform (e.g. Matrix, Slack, Console).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a single action. Zero internal retries; failures are surfaced
    /// to the caller, which owns retry policy.
    async fn deliver(&self, action: &Action) -> Result<(), DeliveryError>;
}
