use collegia_registry::RegistryError;
use collegia_webhook::DeliveryError;
use thiserror::Error;

/// Errors surfaced by dispatcher operations that return synchronously.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The subscription registry failed or the subscription was not found.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A synchronous (test) delivery failed.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// The dispatcher was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DispatchError {
    /// Returns `true` if the subscription does not exist for the tenant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_not_found())
    }
}

/// Errors loading a [`WebhooksConfig`](crate::WebhooksConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
