//! # Note Command
//!
//! Handles `/note` — a small per-conversation notepad kept in session state.
//! `/note <text>` appends, `/note list` shows, `/note clear` forgets.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::error::HandlerError;
use crate::domain::traits::Handler;
use crate::domain::types::{Event, Outcome, SessionPatch, SessionView};
use crate::strings::messages;

pub const NOTES_KEY: &str = "notes";

pub struct NoteHandler;

fn notes_of(session: &SessionView) -> Vec<Value> {
    session
        .get(NOTES_KEY)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl Handler for NoteHandler {
    fn name(&self) -> &'static str {
        "note"
    }

    async fn invoke(&self, event: &Event, session: SessionView) -> Result<Outcome, HandlerError> {
        let conversation = &event.conversation_id;
        match event.args() {
            "" => Ok(Outcome::reply(conversation, messages::NOTE_USAGE)),
            "list" => {
                let notes = notes_of(&session);
                if notes.is_empty() {
                    return Ok(Outcome::reply(conversation, messages::NOTES_EMPTY));
                }
                let listing = notes
                    .iter()
                    .enumerate()
                    .map(|(i, note)| {
                        format!("{}. {}", i + 1, note.as_str().unwrap_or_default())
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Outcome::reply(conversation, listing))
            }
            "clear" => Ok(Outcome::reply(conversation, messages::NOTES_CLEARED)
                .with_mutation(SessionPatch::new().remove(NOTES_KEY))),
            text => {
                let mut notes = notes_of(&session);
                notes.push(json!(text));
                let count = notes.len();
                Ok(Outcome::reply(conversation, messages::note_added(count))
                    .with_mutation(SessionPatch::new().set(NOTES_KEY, Value::Array(notes))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EventKind;
    use std::collections::HashMap;
    use std::time::Instant;

    fn event(body: &str) -> Event {
        Event {
            conversation_id: "!room:example.org".to_string(),
            sender_id: "@alice:example.org".to_string(),
            received_at: Instant::now(),
            kind: EventKind::Command,
            command_token: Some("/note".to_string()),
            body: body.to_string(),
        }
    }

    fn session(state: HashMap<String, Value>) -> SessionView {
        SessionView {
            conversation_id: "!room:example.org".to_string(),
            created_at: chrono::Utc::now(),
            state,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_note_appends_to_existing() {
        let mut state = HashMap::new();
        state.insert(NOTES_KEY.to_string(), json!(["first"]));

        let outcome = NoteHandler
            .invoke(&event("/note second"), session(state))
            .await
            .expect("invoke");

        let patch = outcome.mutation.expect("mutation");
        let mut merged = HashMap::new();
        patch.apply_to(&mut merged);
        assert_eq!(merged.get(NOTES_KEY), Some(&json!(["first", "second"])));
        assert_eq!(outcome.actions[0].payload, messages::note_added(2));
    }

    #[tokio::test]
    async fn test_note_list_and_clear() {
        let mut state = HashMap::new();
        state.insert(NOTES_KEY.to_string(), json!(["a", "b"]));

        let outcome = NoteHandler
            .invoke(&event("/note list"), session(state.clone()))
            .await
            .expect("invoke");
        assert!(outcome.mutation.is_none());
        assert_eq!(outcome.actions[0].payload, "1. a\n2. b");

        let outcome = NoteHandler
            .invoke(&event("/note clear"), session(state))
            .await
            .expect("invoke");
        let patch = outcome.mutation.expect("mutation");
        let mut merged = HashMap::new();
        merged.insert(NOTES_KEY.to_string(), json!(["a", "b"]));
        patch.apply_to(&mut merged);
        assert!(merged.get(NOTES_KEY).is_none());
    }
}
