//! # Greeting Handler
//!
//! Text handler (no command token) that answers greetings. Claims an event
//! via `matches`, so registration order decides ties with other text
//! handlers.

use async_trait::async_trait;

use crate::domain::error::HandlerError;
use crate::domain::traits::Handler;
use crate::domain::types::{Event, EventKind, Outcome, SessionView};
use crate::strings::messages;

const GREETINGS: [&str; 3] = ["hello", "hi", "hey"];

pub struct GreetHandler;

#[async_trait]
impl Handler for GreetHandler {
    fn name(&self) -> &'static str {
        "greet"
    }

    fn matches(&self, event: &Event) -> bool {
        if event.kind != EventKind::Text {
            return false;
        }
        let lowered = event.body.to_lowercase();
        GREETINGS
            .iter()
            .any(|greeting| lowered == *greeting || lowered.starts_with(&format!("{greeting} ")))
    }

    async fn invoke(&self, event: &Event, _session: SessionView) -> Result<Outcome, HandlerError> {
        Ok(Outcome::reply(
            &event.conversation_id,
            messages::greeting(&event.sender_id),
        ))
    }
}
