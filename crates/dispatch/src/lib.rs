//! Event fan-out for Collegia webhooks.
//!
//! [`EventDispatcher::trigger_event`] looks up the active subscriptions of a
//! tenant for an event name and hands one delivery job per subscription to a
//! bounded worker pool, returning before any HTTP request is made.
//! [`EventDispatcher::test_delivery`] sends a synthetic envelope to a single
//! subscription and waits for the outcome.
//!
//! Retries and dead-lettering are an optional layer of the worker pool,
//! enabled with a [`RetryPolicy`]. The executor itself always makes exactly
//! one attempt, and a job waiting out its backoff does not occupy a
//! delivery slot.

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod dlq;
pub mod error;
pub mod metrics;
mod pool;
pub mod retry;

pub use builder::DispatcherBuilder;
pub use config::{DispatcherConfig, WebhooksConfig};
pub use dispatcher::{EventDispatcher, TriggerSummary};
pub use dlq::{DEFAULT_DEAD_LETTER_CAPACITY, DeadLetterEntry, DeadLetterQueue, DeadLetterSink};
pub use error::{ConfigError, DispatchError};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use retry::{RetryPolicy, RetryStrategy};
