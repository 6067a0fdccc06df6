//! # Help Command
//!
//! Handles `/help`. Displays the main help menu to the user.

use async_trait::async_trait;

use crate::domain::error::HandlerError;
use crate::domain::traits::Handler;
use crate::domain::types::{Event, Outcome, SessionView};
use crate::strings;

pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn invoke(&self, event: &Event, _session: SessionView) -> Result<Outcome, HandlerError> {
        Ok(Outcome::reply(&event.conversation_id, strings::help::MAIN))
    }
}
