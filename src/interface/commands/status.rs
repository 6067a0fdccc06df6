//! # Status Command
//!
//! Handles `/status`. Reports bot uptime and the current session's age,
//! version, and note count.

use async_trait::async_trait;
use std::time::Instant;

use crate::domain::error::HandlerError;
use crate::domain::traits::Handler;
use crate::domain::types::{Event, Outcome, SessionView};
use crate::interface::commands::note::NOTES_KEY;
use crate::strings::messages;

pub struct StatusHandler {
    started_at: Instant,
}

impl StatusHandler {
    pub fn new(started_at: Instant) -> Self {
        Self { started_at }
    }
}

#[async_trait]
impl Handler for StatusHandler {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn invoke(&self, event: &Event, session: SessionView) -> Result<Outcome, HandlerError> {
        let uptime = self.started_at.elapsed().as_secs();
        let age = session.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let notes = session
            .get(NOTES_KEY)
            .and_then(|v| v.as_array())
            .map(Vec::len)
            .unwrap_or(0);
        Ok(Outcome::reply(
            &event.conversation_id,
            messages::status_report(uptime, &age, session.version, notes),
        ))
    }
}
