use std::time::Duration;

use reqwest::header::HeaderName;

use crate::error::DeliveryError;

/// `User-Agent` sent with every delivery unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Collegia-Webhook/1.0";

/// Header carrying the hex HMAC-SHA256 of the body.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the delivery executor, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Upper bound on a single request, connect through response headers.
    pub timeout: Duration,

    /// Value of the `User-Agent` header.
    pub user_agent: String,

    /// Name of the header carrying the body signature.
    pub signature_header: String,
}

impl Default for DeliveryConfig {
    /// 10-second timeout, `Collegia-Webhook/1.0`, `X-Webhook-Signature`.
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_owned(),
        }
    }
}

impl DeliveryConfig {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the name of the signature header.
    #[must_use]
    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.signature_header = header.into();
        self
    }

    /// Parse the configured signature header name.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] when the name is not a valid HTTP
    /// header name (empty, or containing spaces or other separators).
    pub fn signature_header_name(&self) -> Result<HeaderName, DeliveryError> {
        HeaderName::from_bytes(self.signature_header.as_bytes()).map_err(|e| {
            DeliveryError::Client(format!(
                "invalid signature header name {:?}: {e}",
                self.signature_header
            ))
        })
    }
}
