//! # Dispatcher
//!
//! Orchestrates one inbound event end to end: normalize → admit → acquire the
//! per-conversation guard → snapshot session → route → invoke handler under a
//! deadline → optimistic commit → enqueue outbound actions.
//!
//! The central guarantee: for a single conversation, events are processed to
//! completion strictly one at a time, in arrival order, while distinct
//! conversations proceed fully in parallel. The guard is a lazily created
//! per-key mutex; tokio's FIFO waiter queue provides the ordering.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::application::normalizer;
use crate::application::outbound::OutboundQueue;
use crate::application::rate_limit::{Admission, RateLimiter};
use crate::application::router::Router;
use crate::application::session::SessionStore;
use crate::domain::error::{HandlerError, NormalizeError};
use crate::domain::traits::Handler;
use crate::domain::types::{Action, Event, InboundMessage, NextState, Outcome, SessionView};
use crate::strings::messages;

/// Terminal state of a dispatch. `Completed` means the event made it through
/// commit and its actions are queued for delivery.
#[derive(Debug)]
pub enum DispatchOutcome {
    Completed { actions: usize },
    Dropped(DropReason),
    Conflict,
}

#[derive(Debug)]
pub enum DropReason {
    Malformed(NormalizeError),
    RateLimited,
    NoRoute,
    Handler(HandlerError),
}

pub struct Dispatcher {
    router: Router,
    sessions: Arc<SessionStore>,
    limiter: RateLimiter,
    outbound: Arc<OutboundQueue>,
    handler_timeout: Duration,
    /// Per-conversation guards, created lazily, reclaimed by `sweep` once
    /// nothing holds them.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    pub fn new(
        router: Router,
        sessions: Arc<SessionStore>,
        limiter: RateLimiter,
        outbound: Arc<OutboundQueue>,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            router,
            sessions,
            limiter,
            outbound,
            handler_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let event = match normalizer::normalize(&message) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("dropping inbound event: {err}");
                return DispatchOutcome::Dropped(DropReason::Malformed(err));
            }
        };

        match self
            .limiter
            .try_admit(&event.sender_id, &event.conversation_id, event.received_at)
            .await
        {
            Admission::Admitted => {}
            Admission::Rejected { notify } => {
                tracing::debug!(
                    sender = %event.sender_id,
                    conversation = %event.conversation_id,
                    "rate limited"
                );
                if notify {
                    self.outbound
                        .enqueue(Action {
                            conversation_id: event.conversation_id.clone(),
                            payload: messages::RATE_LIMITED.to_string(),
                        })
                        .await;
                }
                return DispatchOutcome::Dropped(DropReason::RateLimited);
            }
        }

        // Per-conversation critical section, held through commit or terminal
        // drop. Never a global lock.
        let guard_cell = self.conversation_guard(&event.conversation_id).await;
        let _guard = guard_cell.lock().await;

        let Some(handler) = self.router.resolve(&event) else {
            // No registered handler is a no-op, not an error.
            return DispatchOutcome::Dropped(DropReason::NoRoute);
        };
        let handler_name = handler.name();

        let view = self
            .sessions
            .get_or_create(&event.conversation_id, event.received_at)
            .await;
        let expected_version = view.version;

        let outcome = match self.invoke_handler(handler, &event, view).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    handler = handler_name,
                    conversation = %event.conversation_id,
                    "handler dropped event: {err}"
                );
                return DispatchOutcome::Dropped(DropReason::Handler(err));
            }
        };

        let close = outcome.next == NextState::CloseSession;
        if close || outcome.mutation.is_some() {
            let patch = outcome.mutation.unwrap_or_default();
            if let Err(err) = self
                .sessions
                .commit(
                    &event.conversation_id,
                    expected_version,
                    &patch,
                    close,
                    Instant::now(),
                )
                .await
            {
                tracing::warn!(
                    conversation = %event.conversation_id,
                    "session commit rejected: {err}"
                );
                return DispatchOutcome::Conflict;
            }
        } else {
            self.sessions
                .touch(&event.conversation_id, Instant::now())
                .await;
        }

        let enqueued = outcome.actions.len();
        for action in outcome.actions {
            self.outbound.enqueue(action).await;
        }
        DispatchOutcome::Completed { actions: enqueued }
    }

    /// The transport reported this conversation closed. In-flight dispatches
    /// finish; the session is marked for the next sweep.
    pub async fn close_conversation(&self, conversation_id: &str) {
        self.sessions.close(conversation_id).await;
    }

    /// Periodic housekeeping: evict expired sessions, reclaim idle rate
    /// buckets and unused conversation guards. Runs on its own task, never
    /// inline with a dispatch.
    pub async fn sweep(&self, now: Instant) {
        let sessions = self.sessions.evict_expired(now).await;
        let buckets = self.limiter.sweep_idle(now).await;
        let guards = {
            let mut locks = self.locks.lock().await;
            let before = locks.len();
            locks.retain(|_, guard| Arc::strong_count(guard) > 1);
            before - locks.len()
        };
        if sessions > 0 || buckets > 0 || guards > 0 {
            tracing::debug!(sessions, buckets, guards, "sweep reclaimed idle state");
        }
    }

    async fn conversation_guard(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs the handler on its own task so a panic is caught here instead of
    /// unwinding into the dispatch loop, and aborts it past the deadline so a
    /// stuck handler cannot starve the conversation.
    async fn invoke_handler(
        &self,
        handler: Arc<dyn Handler>,
        event: &Event,
        view: SessionView,
    ) -> Result<Outcome, HandlerError> {
        let event = event.clone();
        let mut task = tokio::spawn(async move { handler.invoke(&event, view).await });
        match tokio::time::timeout(self.handler_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    Err(HandlerError::Panicked)
                } else {
                    Err(HandlerError::Failed(join_err.to_string()))
                }
            }
            Err(_) => {
                task.abort();
                Err(HandlerError::Timeout(self.handler_timeout))
            }
        }
    }
}
