use collegia_core::SubscriptionId;
use thiserror::Error;

/// Errors from subscription registry and store operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The subscription input was rejected (e.g. empty URL or event name).
    #[error("validation error: {0}")]
    Validation(String),

    /// The subscription does not exist or belongs to another tenant.
    #[error("subscription not found: {0}")]
    NotFound(SubscriptionId),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),
}

impl RegistryError {
    /// Returns `true` for [`RegistryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
