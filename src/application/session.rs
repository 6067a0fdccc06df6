//! # Session Store
//!
//! Owns every session. Consumers only ever see [`SessionView`] snapshots and
//! propose mutations back through `commit`, which is an optimistic
//! compare-and-swap on the session version. Eviction runs on the background
//! sweep, never inline with a dispatch; a commit that arrives after eviction
//! fails with `NotFound` instead of reanimating stale state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::error::SessionError;
use crate::domain::types::{SessionPatch, SessionView};

struct Session {
    created_at: DateTime<Utc>,
    last_active_at: Instant,
    state: HashMap<String, Value>,
    version: u64,
    closing: bool,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            created_at: Utc::now(),
            last_active_at: now,
            state: HashMap::new(),
            version: 0,
            closing: false,
        }
    }

    fn view(&self, conversation_id: &str) -> SessionView {
        SessionView {
            conversation_id: conversation_id.to_string(),
            created_at: self.created_at,
            state: self.state.clone(),
            version: self.version,
        }
    }
}

pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Idempotent: returns the existing session or creates a fresh one at
    /// version 0. Also refreshes the activity timestamp.
    pub async fn get_or_create(&self, conversation_id: &str, now: Instant) -> SessionView {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| Session::new(now));
        session.last_active_at = now;
        session.view(conversation_id)
    }

    /// Atomic compare-and-swap on the session version. On mismatch nothing is
    /// written and the caller gets `Conflict`; on a missing session (evicted
    /// since the snapshot) the caller gets `NotFound` — never a recreation.
    pub async fn commit(
        &self,
        conversation_id: &str,
        expected_version: u64,
        patch: &SessionPatch,
        close: bool,
        now: Instant,
    ) -> Result<SessionView, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(conversation_id)
            .ok_or_else(|| SessionError::NotFound(conversation_id.to_string()))?;

        if session.version != expected_version {
            return Err(SessionError::Conflict {
                conversation_id: conversation_id.to_string(),
                expected: expected_version,
                current: session.version,
            });
        }

        patch.apply_to(&mut session.state);
        session.version += 1;
        session.last_active_at = now;
        if close {
            session.closing = true;
        }
        Ok(session.view(conversation_id))
    }

    /// Refreshes activity without a version bump, for dispatches that
    /// committed nothing.
    pub async fn touch(&self, conversation_id: &str, now: Instant) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(conversation_id) {
            session.last_active_at = now;
        }
    }

    /// Marks a session for eviction (transport reported the conversation
    /// closed). In-flight work is allowed to finish; the sweep removes it.
    pub async fn close(&self, conversation_id: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(conversation_id) {
            session.closing = true;
        }
    }

    /// Removes sessions idle beyond the TTL, plus those marked closing.
    /// Returns how many were evicted.
    pub async fn evict_expired(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, session| {
            !session.closing && now.saturating_duration_since(session.last_active_at) <= ttl
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOM: &str = "!room:example.org";

    fn store(ttl_secs: u64) -> SessionStore {
        SessionStore::new(Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = store(60);
        let now = Instant::now();
        let first = store.get_or_create(ROOM, now).await;
        let second = store.get_or_create(ROOM, now).await;
        assert_eq!(first.version, 0);
        assert_eq!(second.version, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_commit_merges_patch_and_bumps_version() {
        let store = store(60);
        let now = Instant::now();
        let view = store.get_or_create(ROOM, now).await;

        let patch = SessionPatch::new().set("topic", json!("rust"));
        let committed = store
            .commit(ROOM, view.version, &patch, false, now)
            .await
            .expect("commit");
        assert_eq!(committed.version, 1);
        assert_eq!(committed.get("topic"), Some(&json!("rust")));

        // Read-back reflects exactly the merged state.
        let reread = store.get_or_create(ROOM, now).await;
        assert_eq!(reread.version, 1);
        assert_eq!(reread.get("topic"), Some(&json!("rust")));
    }

    #[tokio::test]
    async fn test_patch_remove_deletes_key() {
        let store = store(60);
        let now = Instant::now();
        store.get_or_create(ROOM, now).await;
        store
            .commit(ROOM, 0, &SessionPatch::new().set("k", json!(1)), false, now)
            .await
            .expect("set");
        let view = store
            .commit(ROOM, 1, &SessionPatch::new().remove("k"), false, now)
            .await
            .expect("remove");
        assert!(view.get("k").is_none());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = store(60);
        let now = Instant::now();
        store.get_or_create(ROOM, now).await;

        // Both "writers" read version 0; exactly one commit succeeds.
        let patch = SessionPatch::new().set("who", json!("first"));
        store
            .commit(ROOM, 0, &patch, false, now)
            .await
            .expect("first commit");

        let loser = SessionPatch::new().set("who", json!("second"));
        let err = store
            .commit(ROOM, 0, &loser, false, now)
            .await
            .expect_err("stale commit must fail");
        assert!(matches!(err, SessionError::Conflict { current: 1, .. }));

        // The losing patch left no partial write.
        let view = store.get_or_create(ROOM, now).await;
        assert_eq!(view.get("who"), Some(&json!("first")));
        assert_eq!(view.version, 1);
    }

    #[tokio::test]
    async fn test_ttl_eviction_and_fresh_recreation() {
        let store = store(60);
        let start = Instant::now();
        let view = store.get_or_create(ROOM, start).await;
        store
            .commit(
                ROOM,
                view.version,
                &SessionPatch::new().set("n", json!(3)),
                false,
                start,
            )
            .await
            .expect("commit");

        // 61s of idleness: gone after the sweep.
        let later = start + Duration::from_secs(61);
        assert_eq!(store.evict_expired(later).await, 1);
        assert_eq!(store.len().await, 0);

        // A new get_or_create starts from scratch.
        let fresh = store.get_or_create(ROOM, later).await;
        assert_eq!(fresh.version, 0);
        assert!(fresh.get("n").is_none());
    }

    #[tokio::test]
    async fn test_commit_after_eviction_is_not_found() {
        let store = store(60);
        let start = Instant::now();
        let view = store.get_or_create(ROOM, start).await;

        let later = start + Duration::from_secs(61);
        store.evict_expired(later).await;

        let err = store
            .commit(
                ROOM,
                view.version,
                &SessionPatch::new().set("x", json!(true)),
                false,
                later,
            )
            .await
            .expect_err("commit after eviction");
        assert!(matches!(err, SessionError::NotFound(_)));
        // And nothing was silently recreated.
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_closed_session_swept_before_ttl() {
        let store = store(3600);
        let now = Instant::now();
        store.get_or_create(ROOM, now).await;
        store.close(ROOM).await;
        assert_eq!(store.evict_expired(now).await, 1);
    }

    #[tokio::test]
    async fn test_version_counts_committed_mutations() {
        let store = store(60);
        let now = Instant::now();
        store.get_or_create(ROOM, now).await;

        let mut committed = 0u64;
        for i in 0..10 {
            let view = store.get_or_create(ROOM, now).await;
            let patch = SessionPatch::new().set("i", json!(i));
            if store.commit(ROOM, view.version, &patch, false, now).await.is_ok() {
                committed += 1;
            }
        }
        let view = store.get_or_create(ROOM, now).await;
        assert_eq!(view.version, committed);
        assert_eq!(view.version, 10);
    }
}
