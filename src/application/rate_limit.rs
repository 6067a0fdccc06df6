//! # Rate Limiter
//!
//! Token-bucket admission control per (sender, conversation) pair. Buckets
//! refill lazily on each admission check from elapsed time, so no background
//! timer is needed. Rejection is not an error; the dispatcher drops the event
//! and may surface one notice per cooldown window to avoid notice-storms.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// `notify` is true at most once per cooldown window per bucket.
    Rejected { notify: bool },
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_notice: Option<Instant>,
}

pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    notice_cooldown: Duration,
    idle_horizon: Duration,
    buckets: Mutex<HashMap<(String, String), Bucket>>,
}

impl RateLimiter {
    pub fn new(
        capacity: f64,
        refill_per_second: f64,
        notice_cooldown: Duration,
        idle_horizon: Duration,
    ) -> Self {
        Self {
            capacity,
            refill_per_second,
            notice_cooldown,
            idle_horizon,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Refill from elapsed time, then debit one token if available. Buckets
    /// are created lazily at full capacity.
    pub async fn try_admit(
        &self,
        sender_id: &str,
        conversation_id: &str,
        now: Instant,
    ) -> Admission {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry((sender_id.to_string(), conversation_id.to_string()))
            .or_insert_with(|| Bucket {
                tokens: self.capacity,
                last_refill: now,
                last_notice: None,
            });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Admission::Admitted
        } else {
            let notify = match bucket.last_notice {
                Some(at) => now.saturating_duration_since(at) >= self.notice_cooldown,
                None => true,
            };
            if notify {
                bucket.last_notice = Some(now);
            }
            Admission::Rejected { notify }
        }
    }

    /// Drops buckets untouched for longer than the idle horizon. Returns how
    /// many were reclaimed.
    pub async fn sweep_idle(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        let horizon = self.idle_horizon;
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= horizon);
        before - buckets.len()
    }

    #[cfg(test)]
    async fn tokens(&self, sender_id: &str, conversation_id: &str) -> Option<f64> {
        let buckets = self.buckets.lock().await;
        buckets
            .get(&(sender_id.to_string(), conversation_id.to_string()))
            .map(|b| b.tokens)
    }
}
