//! # Command Router
//!
//! Maps a canonical event to at most one registered handler. Command events
//! resolve by exact token first, then longest registered prefix. Text events
//! go to the first registration (in order) whose handler claims them — the
//! registration order tie-break is deliberate and covered by tests.

use std::sync::Arc;

use crate::domain::traits::Handler;
use crate::domain::types::{Event, EventKind};

struct Route {
    /// `None` for text-only registrations.
    pattern: Option<String>,
    handler: Arc<dyn Handler>,
}

#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command handler under a token pattern (e.g. `/help`).
    /// Not safe to call once dispatching has started; registration is an
    /// initialization-phase activity.
    pub fn register(&mut self, pattern: &str, handler: Arc<dyn Handler>) {
        self.routes.push(Route {
            pattern: Some(pattern.to_string()),
            handler,
        });
    }

    /// Registers a handler consulted for text/system events via `matches`.
    pub fn register_text(&mut self, handler: Arc<dyn Handler>) {
        self.routes.push(Route {
            pattern: None,
            handler,
        });
    }

    /// Zero-or-one handler for this event. `None` is a no-op upstream, not
    /// an error.
    pub fn resolve(&self, event: &Event) -> Option<Arc<dyn Handler>> {
        match event.kind {
            EventKind::Command => self.resolve_command(event),
            EventKind::Text | EventKind::System => self
                .routes
                .iter()
                .find(|route| route.handler.matches(event))
                .map(|route| route.handler.clone()),
        }
    }

    fn resolve_command(&self, event: &Event) -> Option<Arc<dyn Handler>> {
        let token = event.command_token.as_deref()?;

        // Exact match wins outright.
        if let Some(route) = self
            .routes
            .iter()
            .find(|route| route.pattern.as_deref() == Some(token))
        {
            return Some(route.handler.clone());
        }

        // Longest registered prefix; first registration wins on equal length.
        let mut best: Option<(usize, &Route)> = None;
        for route in &self.routes {
            let Some(pattern) = route.pattern.as_deref() else {
                continue;
            };
            if token.starts_with(pattern) {
                let longer = match best {
                    Some((len, _)) => pattern.len() > len,
                    None => true,
                };
                if longer {
                    best = Some((pattern.len(), route));
                }
            }
        }
        best.map(|(_, route)| route.handler.clone())
    }
}
