use std::sync::Arc;

use collegia_registry::SubscriptionRegistry;
use collegia_webhook::{Deliverer, DeliveryConfig, DeliveryExecutor};

use crate::config::{DispatcherConfig, WebhooksConfig};
use crate::dispatcher::EventDispatcher;
use crate::dlq::{DEFAULT_DEAD_LETTER_CAPACITY, DeadLetterQueue, DeadLetterSink};
use crate::error::DispatchError;
use crate::metrics::DispatchMetrics;
use crate::pool::WorkerPool;
use crate::retry::{RetryLayer, RetryPolicy};

/// Fluent builder for an [`EventDispatcher`].
///
/// A [`SubscriptionRegistry`] is required. Without an explicit deliverer, a
/// [`DeliveryExecutor`] is built from the delivery config. Retries are off
/// unless a policy is set; when on, abandoned deliveries go to the supplied
/// dead-letter sink or a fresh bounded in-memory [`DeadLetterQueue`].
pub struct DispatcherBuilder {
    registry: Option<SubscriptionRegistry>,
    deliverer: Option<Arc<dyn Deliverer>>,
    delivery_config: DeliveryConfig,
    dispatcher_config: DispatcherConfig,
    retry: Option<RetryPolicy>,
    dlq: Option<Arc<dyn DeadLetterSink>>,
    dead_letter_capacity: usize,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            deliverer: None,
            delivery_config: DeliveryConfig::default(),
            dispatcher_config: DispatcherConfig::default(),
            retry: None,
            dlq: None,
            dead_letter_capacity: DEFAULT_DEAD_LETTER_CAPACITY,
        }
    }

    #[must_use]
    pub fn registry(mut self, registry: SubscriptionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use `deliverer` instead of building a [`DeliveryExecutor`].
    #[must_use]
    pub fn deliverer(mut self, deliverer: Arc<dyn Deliverer>) -> Self {
        self.deliverer = Some(deliverer);
        self
    }

    #[must_use]
    pub fn delivery_config(mut self, config: DeliveryConfig) -> Self {
        self.delivery_config = config;
        self
    }

    #[must_use]
    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher_config = config;
        self
    }

    /// Enable the retry layer for live events.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn dead_letter_sink(mut self, dlq: Arc<dyn DeadLetterSink>) -> Self {
        self.dlq = Some(dlq);
        self
    }

    /// Capacity of the in-memory dead-letter queue used when no sink is
    /// supplied.
    #[must_use]
    pub fn dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.dead_letter_capacity = capacity;
        self
    }

    /// Apply every section of a loaded configuration file.
    #[must_use]
    pub fn config(mut self, config: &WebhooksConfig) -> Self {
        self.delivery_config = config.delivery_config();
        self.dispatcher_config = config.dispatcher_config();
        self.retry = config.retry_policy();
        self.dead_letter_capacity = config.dead_letter_capacity();
        self
    }

    /// Build the dispatcher and start its worker pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<EventDispatcher, DispatchError> {
        let registry = self.registry.ok_or_else(|| {
            DispatchError::Configuration("subscription registry is required".into())
        })?;
        if self.dispatcher_config.max_concurrent == 0 || self.dispatcher_config.queue_capacity == 0
        {
            return Err(DispatchError::Configuration(
                "worker pool sizes must be greater than zero".into(),
            ));
        }

        let executor: Arc<dyn Deliverer> = match self.deliverer {
            Some(deliverer) => deliverer,
            None => Arc::new(DeliveryExecutor::new(self.delivery_config)?),
        };

        let metrics = Arc::new(DispatchMetrics::default());

        let retry = self.retry.map(|policy| {
            let capacity = self.dead_letter_capacity;
            let dead_letters: Arc<dyn DeadLetterSink> = self
                .dlq
                .unwrap_or_else(|| Arc::new(DeadLetterQueue::with_capacity(capacity)));
            RetryLayer {
                policy,
                dead_letters,
            }
        });
        let dlq = retry.as_ref().map(|r| Arc::clone(&r.dead_letters));

        let pool = WorkerPool::start(
            self.dispatcher_config,
            Arc::clone(&executor),
            retry,
            Arc::clone(&metrics),
        );

        Ok(EventDispatcher {
            registry,
            executor,
            pool,
            metrics,
            dlq,
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
