//! # Done Command
//!
//! Handles `/done`. Says goodbye and closes the session; the eviction sweep
//! removes it, and the next message starts fresh at version 0.

use async_trait::async_trait;

use crate::domain::error::HandlerError;
use crate::domain::traits::Handler;
use crate::domain::types::{Event, Outcome, SessionView};
use crate::strings::messages;

pub struct DoneHandler;

#[async_trait]
impl Handler for DoneHandler {
    fn name(&self) -> &'static str {
        "done"
    }

    async fn invoke(&self, event: &Event, _session: SessionView) -> Result<Outcome, HandlerError> {
        Ok(Outcome::reply(&event.conversation_id, messages::SESSION_CLOSED).closing())
    }
}
