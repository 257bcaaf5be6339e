use std::sync::Arc;

use collegia_core::{Event, SubscriptionId, TenantId, WebhookPayload};
use collegia_registry::SubscriptionRegistry;
use collegia_webhook::{Deliverer, DeliveryReceipt};
use tracing::{debug, error, info, instrument, warn};

use crate::dlq::DeadLetterSink;
use crate::error::DispatchError;
use crate::metrics::DispatchMetrics;
use crate::pool::{DeliveryJob, EnqueueError, WorkerPool};

/// Scheduling facts about one `trigger_event` call.
///
/// Says nothing about whether any delivery succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerSummary {
    /// Active subscriptions matching the tenant and event name.
    pub matched: usize,
    /// Jobs handed to the worker pool.
    pub enqueued: usize,
    /// Jobs rejected because the queue was full or shut down.
    pub dropped: usize,
}

/// Fans domain events out to subscribed webhook endpoints.
///
/// Construct with [`DispatcherBuilder`](crate::DispatcherBuilder).
pub struct EventDispatcher {
    pub(crate) registry: SubscriptionRegistry,
    /// Single-attempt deliverer used by `test_delivery`.
    pub(crate) executor: Arc<dyn Deliverer>,
    pub(crate) pool: WorkerPool,
    pub(crate) metrics: Arc<DispatchMetrics>,
    pub(crate) dlq: Option<Arc<dyn DeadLetterSink>>,
}

impl EventDispatcher {
    /// Notify every active subscription of `tenant` listening for `event`.
    ///
    /// Returns once the matching jobs are queued; never waits for a delivery
    /// and never reports delivery failures. A registry failure is logged and
    /// yields an empty summary so the calling business operation is not
    /// affected.
    #[instrument(skip(self, payload), fields(tenant = %tenant))]
    pub async fn trigger_event(
        &self,
        tenant: &TenantId,
        event: &str,
        payload: serde_json::Value,
    ) -> TriggerSummary {
        self.metrics.increment_triggered();

        let subscriptions = match self.registry.list_active_for_event(tenant, event).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(error = %e, "failed to look up webhook subscriptions");
                return TriggerSummary::default();
            }
        };

        let mut summary = TriggerSummary {
            matched: subscriptions.len(),
            ..TriggerSummary::default()
        };
        if subscriptions.is_empty() {
            debug!("no active subscriptions for event");
            return summary;
        }

        let envelope = Arc::new(WebhookPayload::for_event(&Event::new(
            tenant.clone(),
            event,
            payload,
        )));

        for subscription in subscriptions {
            let subscription_id = subscription.id.clone();
            let job = DeliveryJob {
                subscription,
                payload: Arc::clone(&envelope),
            };
            match self.pool.try_enqueue(job) {
                Ok(()) => {
                    self.metrics.increment_enqueued();
                    summary.enqueued += 1;
                }
                Err(reason) => {
                    self.metrics.increment_dropped();
                    summary.dropped += 1;
                    warn!(
                        subscription_id = %subscription_id,
                        queue_closed = reason == EnqueueError::Closed,
                        "webhook delivery dropped"
                    );
                }
            }
        }

        info!(
            matched = summary.matched,
            enqueued = summary.enqueued,
            dropped = summary.dropped,
            "webhook event fanned out"
        );
        summary
    }

    /// Send the synthetic test envelope to one subscription and wait for the
    /// outcome.
    ///
    /// Inactive subscriptions are still probed. The retry layer is bypassed,
    /// so exactly one request is made. Unknown or foreign ids fail with a
    /// not-found registry error before any network call.
    #[instrument(skip(self), fields(tenant = %tenant, subscription_id = %id))]
    pub async fn test_delivery(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let subscription = self.registry.get(tenant, id).await?;
        let receipt = self
            .executor
            .deliver(&subscription, &WebhookPayload::test())
            .await?;
        info!(status = receipt.status_code, "test webhook delivered");
        Ok(receipt)
    }

    /// Stop accepting events and wait for queued and in-flight deliveries.
    ///
    /// Events triggered afterwards are dropped and counted.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
        info!("webhook dispatcher shutdown complete");
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// The dead-letter sink, when the retry layer is enabled.
    pub fn dead_letters(&self) -> Option<&Arc<dyn DeadLetterSink>> {
        self.dlq.as_ref()
    }
}
