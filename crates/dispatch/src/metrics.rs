use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking webhook fan-out and delivery outcomes.
///
/// All counters use relaxed ordering. For a point-in-time view, call
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// `trigger_event` calls.
    pub triggered: AtomicU64,
    /// Delivery jobs accepted by the worker pool.
    pub enqueued: AtomicU64,
    /// Delivery jobs rejected because the queue was full or closed.
    pub dropped: AtomicU64,
    /// Deliveries accepted by the remote endpoint.
    pub delivered: AtomicU64,
    /// Deliveries that finally failed.
    pub failed: AtomicU64,
    /// Deliveries handed to the dead-letter sink.
    pub dead_lettered: AtomicU64,
    /// Dead-letter entries a bounded sink evicted to make room.
    pub dead_letters_evicted: AtomicU64,
}

impl DispatchMetrics {
    pub fn increment_triggered(&self) {
        self.triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dead_letters_evicted(&self) {
        self.dead_letters_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            triggered: self.triggered.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            dead_letters_evicted: self.dead_letters_evicted.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub triggered: u64,
    pub enqueued: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dead_lettered: u64,
    pub dead_letters_evicted: u64,
}
