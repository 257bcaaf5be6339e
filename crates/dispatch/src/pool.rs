use std::sync::{Arc, Mutex, PoisonError};

use collegia_core::{Subscription, WebhookPayload};
use collegia_webhook::Deliverer;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::config::DispatcherConfig;
use crate::metrics::DispatchMetrics;
use crate::retry::RetryLayer;

/// One subscription paired with a shared envelope.
pub(crate) struct DeliveryJob {
    pub subscription: Subscription,
    pub payload: Arc<WebhookPayload>,
}

/// Why a job was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnqueueError {
    Full,
    Closed,
}

/// Bounded queue feeding a pump that keeps at most `max_concurrent` HTTP
/// attempts in flight.
///
/// Every delivery runs in its own task, so a failure, timeout or panic in one
/// job never reaches its siblings. With a retry layer, a job waiting out its
/// backoff gives its slot back and queues for a new one when the delay ends.
pub(crate) struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<DeliveryJob>>>,
    tracker: TaskTracker,
}

impl WorkerPool {
    /// Start the pump. Must be called from within a tokio runtime.
    pub fn start(
        config: DispatcherConfig,
        deliverer: Arc<dyn Deliverer>,
        retry: Option<RetryLayer>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        let (sender, mut receiver) = mpsc::channel::<DeliveryJob>(config.queue_capacity);
        let tracker = TaskTracker::new();
        let worker = Arc::new(Worker {
            deliverer,
            retry,
            metrics,
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
        });

        let job_tracker = tracker.clone();
        tracker.spawn(async move {
            while let Some(job) = receiver.recv().await {
                let Ok(permit) = Arc::clone(&worker.slots).acquire_owned().await else {
                    break; // semaphore closed
                };
                let worker = Arc::clone(&worker);
                job_tracker.spawn(async move {
                    worker.run(job, permit).await;
                });
            }
            debug!("webhook delivery queue closed");
        });

        Self {
            sender: Mutex::new(Some(sender)),
            tracker,
        }
    }

    /// Queue a job without waiting for space.
    pub fn try_enqueue(&self, job: DeliveryJob) -> Result<(), EnqueueError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(EnqueueError::Closed);
        };
        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Stop accepting jobs, then wait for queued and running ones (including
    /// pending retries) to finish.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
        self.tracker.close();
        self.tracker.wait().await;
    }
}

struct Worker {
    deliverer: Arc<dyn Deliverer>,
    retry: Option<RetryLayer>,
    metrics: Arc<DispatchMetrics>,
    /// One permit per HTTP attempt in flight.
    slots: Arc<Semaphore>,
}

impl Worker {
    async fn run(&self, job: DeliveryJob, first: OwnedSemaphorePermit) {
        let DeliveryJob {
            subscription,
            payload,
        } = job;

        let mut next_permit = Some(first);
        let mut attempts = 0;
        loop {
            let permit = match next_permit.take() {
                Some(permit) => permit,
                None => match Arc::clone(&self.slots).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };
            attempts += 1;

            let err = match self.deliverer.deliver(&subscription, &payload).await {
                Ok(receipt) => {
                    self.metrics.increment_delivered();
                    debug!(
                        subscription_id = %subscription.id,
                        status = receipt.status_code,
                        attempts,
                        "webhook delivery succeeded"
                    );
                    return;
                }
                Err(err) => err,
            };
            drop(permit);

            let backoff = self
                .retry
                .as_ref()
                .and_then(|retry| retry.policy.backoff(&err, attempts));
            if let Some(delay) = backoff {
                debug!(
                    subscription_id = %subscription.id,
                    attempts,
                    error = %err,
                    delay_ms = %delay.as_millis(),
                    "retryable delivery error, will retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            self.metrics.increment_failed();
            warn!(
                subscription_id = %subscription.id,
                tenant = %subscription.tenant,
                event = %payload.event,
                kind = %err.kind(),
                attempts,
                error = %err,
                "webhook delivery failed"
            );
            if let Some(retry) = &self.retry {
                retry
                    .dead_letter(&subscription, &payload, &err, attempts, &self.metrics)
                    .await;
            }
            return;
        }
    }
}
