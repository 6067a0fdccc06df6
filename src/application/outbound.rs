//! # Outbound Queue
//!
//! FIFO buffer between handlers and the transport. Per conversation the
//! delivery order matches enqueue order; across conversations there is no
//! ordering guarantee. The delivery loop parks on `notified` until a handler
//! enqueues something.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{Mutex, Notify};

use crate::domain::types::Action;

#[derive(Default)]
pub struct OutboundQueue {
    queues: Mutex<HashMap<String, VecDeque<Action>>>,
    wakeup: Notify,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, action: Action) {
        let mut queues = self.queues.lock().await;
        queues
            .entry(action.conversation_id.clone())
            .or_default()
            .push_back(action);
        self.wakeup.notify_one();
    }

    /// Takes every buffered action for one conversation, in enqueue order.
    /// Restartable only via re-enqueue.
    pub async fn drain(&self, conversation_id: &str) -> Vec<Action> {
        let mut queues = self.queues.lock().await;
        queues
            .remove(conversation_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Takes everything currently buffered, grouped by conversation.
    pub async fn drain_ready(&self) -> Vec<(String, Vec<Action>)> {
        let mut queues = self.queues.lock().await;
        queues
            .drain()
            .map(|(conversation_id, queue)| (conversation_id, Vec::from(queue)))
            .collect()
    }

    /// Resolves once new work has been enqueued since the last drain.
    pub async fn notified(&self) {
        self.wakeup.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(conversation: &str, payload: &str) -> Action {
        Action {
            conversation_id: conversation.to_string(),
            payload: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fifo_within_conversation() {
        let queue = OutboundQueue::new();
        queue.enqueue(action("!a:example.org", "one")).await;
        queue.enqueue(action("!a:example.org", "two")).await;
        queue.enqueue(action("!a:example.org", "three")).await;

        let drained = queue.drain("!a:example.org").await;
        let payloads: Vec<_> = drained.iter().map(|a| a.payload.as_str()).collect();
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let queue = OutboundQueue::new();
        queue.enqueue(action("!a:example.org", "for-a")).await;
        queue.enqueue(action("!b:example.org", "for-b")).await;

        let a = queue.drain("!a:example.org").await;
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].payload, "for-a");

        let ready = queue.drain_ready().await;
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].0, "!b:example.org");
    }

    #[tokio::test]
    async fn test_drain_is_consuming() {
        let queue = OutboundQueue::new();
        queue.enqueue(action("!a:example.org", "once")).await;
        assert_eq!(queue.drain("!a:example.org").await.len(), 1);
        assert!(queue.drain("!a:example.org").await.is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_wakes_waiter() {
        let queue = std::sync::Arc::new(OutboundQueue::new());
        let waiter = queue.clone();
        let handle = tokio::spawn(async move {
            waiter.notified().await;
            waiter.drain_ready().await
        });
        // Give the waiter a chance to park first.
        tokio::task::yield_now().await;
        queue.enqueue(action("!a:example.org", "wake")).await;
        let ready = handle.await.expect("waiter task");
        assert_eq!(ready.len(), 1);
    }
}
