use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use collegia_core::{Subscription, WebhookPayload};
use collegia_webhook::DeliveryError;
use tracing::warn;

use crate::dlq::{DeadLetterEntry, DeadLetterSink};
use crate::metrics::DispatchMetrics;

/// Strategy for computing delay between retry attempts.
///
/// All variants clamp the computed delay so it never exceeds the configured
/// maximum.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^attempt`, optionally with
    /// deterministic jitter.
    Exponential {
        base: Duration,
        max: Duration,
        multiplier: f64,
        /// Spread concurrent retries by +0% to +40% depending on the attempt
        /// number.
        jitter: bool,
    },
    /// Linear backoff: `delay * (attempt + 1)`, clamped to `max`.
    Linear { delay: Duration, max: Duration },
    /// Constant delay between every retry attempt.
    Constant { delay: Duration },
}

impl RetryStrategy {
    /// Compute the delay before retrying after the zero-based `attempt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use collegia_dispatch::RetryStrategy;
    ///
    /// let strategy = RetryStrategy::Constant { delay: Duration::from_secs(1) };
    /// assert_eq!(strategy.delay_for(0), Duration::from_secs(1));
    /// assert_eq!(strategy.delay_for(5), Duration::from_secs(1));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                // Retry counts are small, so the cast cannot wrap.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base.as_secs_f64() * multiplier.powi(attempt as i32);
                let adjusted = if *jitter {
                    raw * (1.0 + 0.1 * f64::from(attempt % 5))
                } else {
                    raw
                };
                Duration::from_secs_f64(adjusted.min(max.as_secs_f64()))
            }
            Self::Linear { delay, max } => {
                let raw = delay.as_secs_f64() * f64::from(attempt + 1);
                Duration::from_secs_f64(raw.min(max.as_secs_f64()))
            }
            Self::Constant { delay } => *delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

/// How many times, and how far apart, to retry a failed delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` means a single attempt.
    pub max_retries: u32,
    pub strategy: RetryStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            strategy: RetryStrategy::default(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` when the delivery should be
    /// abandoned.
    ///
    /// `attempts` counts the requests already made, so it is at least 1.
    /// Only retryable errors (see [`DeliveryError::is_retryable`]) are
    /// retried, at most [`max_retries`](Self::max_retries) times.
    pub fn backoff(&self, err: &DeliveryError, attempts: u32) -> Option<Duration> {
        let retries_made = attempts.saturating_sub(1);
        (err.is_retryable() && retries_made < self.max_retries)
            .then(|| self.strategy.delay_for(retries_made))
    }
}

/// Retry policy for live deliveries plus the sink receiving the ones the
/// worker pool gives up on.
#[derive(Clone)]
pub(crate) struct RetryLayer {
    pub policy: RetryPolicy,
    pub dead_letters: Arc<dyn DeadLetterSink>,
}

impl RetryLayer {
    /// Record an abandoned delivery in the dead-letter sink.
    pub async fn dead_letter(
        &self,
        subscription: &Subscription,
        payload: &WebhookPayload,
        err: &DeliveryError,
        attempts: u32,
        metrics: &DispatchMetrics,
    ) {
        let evicted = self
            .dead_letters
            .push(DeadLetterEntry {
                subscription_id: subscription.id.clone(),
                tenant: subscription.tenant.clone(),
                url: subscription.url.clone(),
                payload: payload.clone(),
                error: err.to_string(),
                attempts,
                timestamp: Utc::now(),
            })
            .await;
        metrics.increment_dead_lettered();
        warn!(
            subscription_id = %subscription.id,
            attempts,
            error = %err,
            "webhook delivery dead-lettered"
        );

        if let Some(evicted) = evicted {
            metrics.increment_dead_letters_evicted();
            warn!(
                subscription_id = %evicted.subscription_id,
                tenant = %evicted.tenant,
                event = evicted.event(),
                "dead-letter queue full, oldest entry evicted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use collegia_core::{Event, SubscriptionId, TenantId};

    use super::*;
    use crate::dlq::DeadLetterQueue;

    fn server_error() -> DeliveryError {
        DeliveryError::RemoteRejected { status: 503 }
    }

    fn subscription() -> Subscription {
        let now = Utc::now();
        Subscription {
            id: SubscriptionId::new("sub-1"),
            tenant: TenantId::from(42_u64),
            url: "https://example.test/hook".into(),
            event: "grade.posted".into(),
            secret: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn payload() -> WebhookPayload {
        WebhookPayload::for_event(&Event::new(
            42_u64,
            "grade.posted",
            serde_json::json!({"grade": 91}),
        ))
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            strategy: RetryStrategy::Linear {
                delay: Duration::from_secs(1),
                max: Duration::from_secs(10),
            },
        }
    }

    #[test]
    fn exponential_no_jitter_clamped() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
            multiplier: 3.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_secs(1));
        assert_eq!(strategy.delay_for(1), Duration::from_secs(3));
        assert_eq!(strategy.delay_for(2), Duration::from_secs(5));
        assert_eq!(strategy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn exponential_with_jitter() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
        // 200ms * 1.1
        assert_eq!(strategy.delay_for(1), Duration::from_millis(220));
        // 5 % 5 == 0, no jitter
        assert_eq!(strategy.delay_for(5), Duration::from_millis(3200));
    }

    #[test]
    fn linear_clamped() {
        let strategy = RetryStrategy::Linear {
            delay: Duration::from_millis(500),
            max: Duration::from_secs(2),
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for(9), Duration::from_secs(2));
    }

    #[test]
    fn backoff_follows_strategy_until_retries_run_out() {
        let policy = policy(2);
        assert_eq!(
            policy.backoff(&server_error(), 1),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            policy.backoff(&server_error(), 2),
            Some(Duration::from_secs(2))
        );
        assert_eq!(policy.backoff(&server_error(), 3), None);
    }

    #[test]
    fn backoff_never_retries_final_errors() {
        let policy = policy(5);
        assert_eq!(
            policy.backoff(&DeliveryError::RemoteRejected { status: 400 }, 1),
            None
        );
        assert_eq!(
            policy.backoff(&DeliveryError::Client("bad header".into()), 1),
            None
        );
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let transport = DeliveryError::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert_eq!(policy(0).backoff(&transport, 1), None);
    }

    #[tokio::test]
    async fn dead_letter_records_entry_and_counts_evictions() {
        let dlq = Arc::new(DeadLetterQueue::with_capacity(1));
        let layer = RetryLayer {
            policy: policy(2),
            dead_letters: dlq.clone(),
        };
        let metrics = DispatchMetrics::default();

        layer
            .dead_letter(&subscription(), &payload(), &server_error(), 3, &metrics)
            .await;
        layer
            .dead_letter(&subscription(), &payload(), &server_error(), 1, &metrics)
            .await;

        let snap = metrics.snapshot();
        assert_eq!(snap.dead_lettered, 2);
        assert_eq!(snap.dead_letters_evicted, 1);

        let entries = dlq.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attempts, 1);
        assert_eq!(entries[0].subscription_id.as_str(), "sub-1");
        assert_eq!(entries[0].url, "https://example.test/hook");
        assert_eq!(entries[0].event(), "grade.posted");
        assert!(entries[0].error.contains("503"));
    }
}
