//! # Domain Types
//!
//! Canonical event, session, and outcome structures shared across the
//! application logic. These are the only shapes handlers ever see.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// Raw material handed over by a transport adapter. The normalizer is the
/// only consumer; it validates the identity fields and classifies the body.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    /// Monotonic receipt instant, captured by the transport adapter.
    pub received_at: Instant,
    /// True for transport-level notifications (membership changes etc.)
    /// rather than user-authored messages.
    pub system: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Command,
    Text,
    System,
}

/// Canonical inbound event. Immutable once constructed by the normalizer.
#[derive(Debug, Clone)]
pub struct Event {
    pub conversation_id: String,
    pub sender_id: String,
    pub received_at: Instant,
    pub kind: EventKind,
    /// Present iff `kind == Command`. Always spelled with a leading `/`,
    /// regardless of the sigil the user typed.
    pub command_token: Option<String>,
    pub body: String,
}

impl Event {
    /// Everything after the command token, trimmed. Empty for bare commands.
    pub fn args(&self) -> &str {
        match self.body.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim(),
            None => "",
        }
    }
}

/// Read-only snapshot of a session, scoped to a single dispatch. Handlers
/// must not retain it beyond their invocation; mutations travel back as a
/// [`SessionPatch`] inside the [`Outcome`].
#[derive(Debug, Clone)]
pub struct SessionView {
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub state: HashMap<String, Value>,
    pub version: u64,
}

impl SessionView {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }
}

/// Ordered set/remove entries merged onto the session state at commit time.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    entries: Vec<(String, Option<Value>)>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), Some(value)));
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.entries.push((key.into(), None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the patch in entry order. Later entries win over earlier ones.
    pub fn apply_to(&self, state: &mut HashMap<String, Value>) {
        for (key, value) in &self.entries {
            match value {
                Some(v) => {
                    state.insert(key.clone(), v.clone());
                }
                None => {
                    state.remove(key);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextState {
    #[default]
    Continue,
    CloseSession,
}

/// What a handler invocation produced: an optional state mutation, ordered
/// outbound actions, and the session's next lifecycle step.
#[derive(Debug, Default)]
pub struct Outcome {
    pub mutation: Option<SessionPatch>,
    pub actions: Vec<Action>,
    pub next: NextState,
}

impl Outcome {
    /// A plain reply into the conversation, with no session mutation.
    pub fn reply(conversation_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mutation: None,
            actions: vec![Action {
                conversation_id: conversation_id.into(),
                payload: payload.into(),
            }],
            next: NextState::Continue,
        }
    }

    pub fn with_mutation(mut self, patch: SessionPatch) -> Self {
        self.mutation = Some(patch);
        self
    }

    pub fn closing(mut self) -> Self {
        self.next = NextState::CloseSession;
        self
    }
}

/// One outbound message. The conversation id doubles as the ordering key:
/// the outbound queue never reorders actions sharing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub conversation_id: String,
    pub payload: String,
}
