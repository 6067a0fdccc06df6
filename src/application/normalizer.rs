//! # Event Normalizer
//!
//! Converts raw transport messages into canonical [`Event`]s. Pure function,
//! no shared state, no I/O. Anything without a usable conversation and sender
//! identity is rejected as malformed and dropped by the caller.

use crate::domain::error::NormalizeError;
use crate::domain::types::{Event, EventKind, InboundMessage};

/// Command sigils accepted at the start of a message body. The canonical
/// token always uses `/` so registrations only need one spelling.
const COMMAND_SIGILS: [char; 2] = ['/', '.'];

pub fn normalize(msg: &InboundMessage) -> Result<Event, NormalizeError> {
    if msg.conversation_id.trim().is_empty() {
        return Err(NormalizeError::Malformed("missing conversation id"));
    }
    if msg.sender_id.trim().is_empty() {
        return Err(NormalizeError::Malformed("missing sender id"));
    }

    let body = msg.body.trim();
    if body.is_empty() && !msg.system {
        return Err(NormalizeError::Malformed("empty body"));
    }

    let (kind, command_token) = if msg.system {
        (EventKind::System, None)
    } else {
        match command_token(body) {
            Some(token) => (EventKind::Command, Some(token)),
            None => (EventKind::Text, None),
        }
    };

    Ok(Event {
        conversation_id: msg.conversation_id.clone(),
        sender_id: msg.sender_id.clone(),
        received_at: msg.received_at,
        kind,
        command_token,
        body: body.to_string(),
    })
}

/// First whitespace-delimited word, canonicalized to a leading `/`.
/// A bare sigil ("." or "/") is not a command.
fn command_token(body: &str) -> Option<String> {
    let first = body.split_whitespace().next()?;
    let rest = first.strip_prefix(COMMAND_SIGILS)?;
    if rest.is_empty() {
        return None;
    }
    Some(format!("/{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn msg(conversation: &str, sender: &str, body: &str) -> InboundMessage {
        InboundMessage {
            conversation_id: conversation.to_string(),
            sender_id: sender.to_string(),
            body: body.to_string(),
            received_at: Instant::now(),
            system: false,
        }
    }

    #[test]
    fn test_command_classification() {
        let event = normalize(&msg("!room:example.org", "@alice:example.org", "/help me"))
            .expect("valid message");
        assert_eq!(event.kind, EventKind::Command);
        assert_eq!(event.command_token.as_deref(), Some("/help"));
        assert_eq!(event.args(), "me");
    }

    #[test]
    fn test_dot_sigil_canonicalized() {
        let event =
            normalize(&msg("!room:example.org", "@alice:example.org", ".status")).expect("valid");
        assert_eq!(event.command_token.as_deref(), Some("/status"));
    }

    #[test]
    fn test_plain_text() {
        let event = normalize(&msg("!room:example.org", "@alice:example.org", "hello there"))
            .expect("valid");
        assert_eq!(event.kind, EventKind::Text);
        assert!(event.command_token.is_none());
    }

    #[test]
    fn test_bare_sigil_is_text() {
        let event =
            normalize(&msg("!room:example.org", "@alice:example.org", ". hmm")).expect("valid");
        assert_eq!(event.kind, EventKind::Text);
    }

    #[test]
    fn test_malformed_rejected() {
        assert_eq!(
            normalize(&msg("", "@alice:example.org", "hi")).unwrap_err(),
            NormalizeError::Malformed("missing conversation id")
        );
        assert_eq!(
            normalize(&msg("!room:example.org", "  ", "hi")).unwrap_err(),
            NormalizeError::Malformed("missing sender id")
        );
        assert_eq!(
            normalize(&msg("!room:example.org", "@alice:example.org", "   ")).unwrap_err(),
            NormalizeError::Malformed("empty body")
        );
    }

    #[test]
    fn test_system_event_allows_empty_body() {
        let mut m = msg("!room:example.org", "@alice:example.org", "");
        m.system = true;
        let event = normalize(&m).expect("valid system event");
        assert_eq!(event.kind, EventKind::System);
    }
}
