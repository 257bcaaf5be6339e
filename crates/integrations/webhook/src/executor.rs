use std::time::Instant;

use async_trait::async_trait;
use collegia_core::{Subscription, WebhookPayload};
use reqwest::Client;
use reqwest::header::HeaderName;
use tracing::{debug, instrument, warn};

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use crate::signer;
use crate::types::DeliveryReceipt;

/// Anything that can deliver one envelope to one subscription.
///
/// [`DeliveryExecutor`] is the production implementation; retry layers and
/// test doubles wrap or replace it.
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &WebhookPayload,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Performs exactly one signed HTTP POST per call.
///
/// The underlying `reqwest::Client` (and its connection pool) is shared by
/// every delivery made through this executor. Redirects are never followed.
#[derive(Debug, Clone)]
pub struct DeliveryExecutor {
    config: DeliveryConfig,
    signature_header: HeaderName,
    client: Client,
}

impl DeliveryExecutor {
    /// Build an executor with its own HTTP client.
    ///
    /// Header names and values are checked here, so a bad configuration fails
    /// once with [`DeliveryError::Client`] instead of on every delivery.
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        let signature_header = config.signature_header_name()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        Ok(Self {
            config,
            signature_header,
            client,
        })
    }

    /// Serialize the envelope into the exact bytes that get signed and sent.
    ///
    /// Going through `serde_json::Value` yields compact JSON with object keys
    /// in sorted order.
    fn encode(payload: &WebhookPayload) -> Result<Vec<u8>, DeliveryError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| DeliveryError::InvalidPayload(format!("failed to serialize payload: {e}")))?;
        serde_json::to_vec(&value).map_err(|e| DeliveryError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl Deliverer for DeliveryExecutor {
    #[instrument(
        skip(self, subscription, payload),
        fields(
            subscription_id = %subscription.id,
            tenant = %subscription.tenant,
            event = %payload.event,
        )
    )]
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &WebhookPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let body = Self::encode(payload)?;

        let mut request = self
            .client
            .post(&subscription.url)
            .timeout(self.config.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, &self.config.user_agent);

        if subscription.is_signed() {
            let signature = signer::sign(&subscription.secret, &body)?;
            request = request.header(self.signature_header.clone(), signature);
        } else {
            debug!("subscription has no secret, delivering unsigned");
        }

        debug!(url = %subscription.url, bytes = body.len(), "dispatching webhook");

        let started = Instant::now();
        let response = request.body(body).send().await.map_err(|e| {
            let err = DeliveryError::from_reqwest(&e);
            warn!(error = %e, timed_out = err.is_timeout(), "webhook transport failure");
            err
        })?;
        let elapsed = started.elapsed();

        let status = response.status().as_u16();
        if status >= 400 {
            warn!(status, "webhook endpoint rejected delivery");
            return Err(DeliveryError::RemoteRejected { status });
        }

        debug!(status, elapsed_ms = elapsed.as_millis(), "webhook delivered");
        Ok(DeliveryReceipt::new(status, elapsed))
    }
}
