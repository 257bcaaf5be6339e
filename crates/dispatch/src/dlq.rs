use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use collegia_core::{SubscriptionId, TenantId, WebhookPayload};

/// A delivery abandoned after the retry layer gave up on it.
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub subscription_id: SubscriptionId,
    pub tenant: TenantId,
    /// Target URL at the time of the final attempt.
    pub url: String,
    /// The envelope that could not be delivered.
    pub payload: WebhookPayload,
    /// Human-readable description of the final error.
    pub error: String,
    /// Number of delivery attempts made before giving up.
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

impl DeadLetterEntry {
    /// Event name carried by the abandoned envelope.
    pub fn event(&self) -> &str {
        &self.payload.event
    }
}

/// Entries an in-memory [`DeadLetterQueue`] keeps by default.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 1000;

/// Trait for dead-letter queue backends.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Append a failed delivery.
    ///
    /// Bounded backends return the entry they evicted to make room.
    async fn push(&self, entry: DeadLetterEntry) -> Option<DeadLetterEntry>;

    /// Remove and return every entry, oldest first.
    async fn drain(&self) -> Vec<DeadLetterEntry>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Bounded in-memory dead-letter queue.
///
/// Keeps at most `capacity` entries; once full, each push evicts the oldest.
/// The [`Mutex`] is never held across an `.await`. Suitable for tests,
/// development and the CLI; long-running services that need every entry
/// should supply a durable [`DeadLetterSink`].
#[derive(Debug)]
pub struct DeadLetterQueue {
    entries: Mutex<VecDeque<DeadLetterEntry>>,
    capacity: usize,
}

impl DeadLetterQueue {
    /// Create an empty queue holding up to [`DEFAULT_DEAD_LETTER_CAPACITY`]
    /// entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use collegia_dispatch::DeadLetterQueue;
    ///
    /// let dlq = DeadLetterQueue::new();
    /// assert!(dlq.is_empty());
    /// assert_eq!(dlq.capacity(), 1000);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DEAD_LETTER_CAPACITY)
    }

    /// Create an empty queue holding up to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `entry`, returning the oldest entry if it had to be evicted.
    pub fn push(&self, entry: DeadLetterEntry) -> Option<DeadLetterEntry> {
        let mut entries = self.lock();
        let evicted = if entries.len() >= self.capacity {
            entries.pop_front()
        } else {
            None
        };
        entries.push_back(entry);
        evicted
    }

    pub fn drain(&self) -> Vec<DeadLetterEntry> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DeadLetterEntry>> {
        // A panic while pushing cannot leave the deque half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeadLetterQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeadLetterSink for DeadLetterQueue {
    async fn push(&self, entry: DeadLetterEntry) -> Option<DeadLetterEntry> {
        DeadLetterQueue::push(self, entry)
    }

    async fn drain(&self) -> Vec<DeadLetterEntry> {
        DeadLetterQueue::drain(self)
    }

    async fn len(&self) -> usize {
        DeadLetterQueue::len(self)
    }
}

#[cfg(test)]
mod tests {
    use collegia_core::Event;

    use super::*;

    fn entry(error: &str, attempts: u32) -> DeadLetterEntry {
        DeadLetterEntry {
            subscription_id: SubscriptionId::new("sub-1"),
            tenant: TenantId::from(42_u64),
            url: "https://example.test/hook".into(),
            payload: WebhookPayload::for_event(&Event::new(
                42_u64,
                "grade.posted",
                serde_json::json!({"grade": 91}),
            )),
            error: error.to_owned(),
            attempts,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_queue_is_empty() {
        let dlq = DeadLetterQueue::new();
        assert!(dlq.is_empty());
        assert_eq!(dlq.len(), 0);
    }

    #[test]
    fn drain_returns_entries_in_order_and_empties_queue() {
        let dlq = DeadLetterQueue::new();
        dlq.push(entry("e1", 1));
        dlq.push(entry("e2", 4));
        assert_eq!(dlq.len(), 2);

        let entries = dlq.drain();
        assert!(dlq.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].error, "e1");
        assert_eq!(entries[1].attempts, 4);
        assert_eq!(entries[1].event(), "grade.posted");
    }

    #[test]
    fn full_queue_evicts_oldest() {
        let dlq = DeadLetterQueue::with_capacity(2);
        assert!(dlq.push(entry("e1", 1)).is_none());
        assert!(dlq.push(entry("e2", 1)).is_none());

        let evicted = dlq.push(entry("e3", 1)).unwrap();
        assert_eq!(evicted.error, "e1");
        assert_eq!(dlq.push(entry("e4", 1)).unwrap().error, "e2");
        assert_eq!(dlq.len(), 2);

        let errors: Vec<String> = dlq.drain().into_iter().map(|e| e.error).collect();
        assert_eq!(errors, vec!["e3", "e4"]);
    }

    #[test]
    fn zero_capacity_keeps_latest_entry() {
        let dlq = DeadLetterQueue::with_capacity(0);
        assert_eq!(dlq.capacity(), 1);
        dlq.push(entry("e1", 1));
        dlq.push(entry("e2", 1));
        assert_eq!(dlq.len(), 1);
        assert_eq!(dlq.drain()[0].error, "e2");
    }

    #[tokio::test]
    async fn usable_as_dyn_sink() {
        let dlq = DeadLetterQueue::new();
        let sink: &dyn DeadLetterSink = &dlq;
        assert!(sink.is_empty().await);
        sink.push(entry("boom", 2)).await;
        assert_eq!(sink.len().await, 1);
        assert_eq!(sink.drain().await.len(), 1);
        assert!(sink.is_empty().await);
    }
}
