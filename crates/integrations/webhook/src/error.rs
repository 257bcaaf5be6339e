use thiserror::Error;

use crate::signer::SignatureError;

/// Why a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never produced a response: DNS, connect, TLS, timeout or
    /// an unparseable URL.
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// The endpoint answered with a status of 400 or above.
    #[error("remote endpoint rejected delivery with HTTP {status}")]
    RemoteRejected { status: u16 },

    /// The envelope could not be serialized into a request body.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The body could not be signed.
    #[error("signing error: {0}")]
    Signing(#[from] SignatureError),

    /// The executor could not be built from its configuration.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Coarse classification of a [`DeliveryError`], suitable for logs and
/// metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryErrorKind {
    Transport,
    RemoteRejected,
    Payload,
}

impl DeliveryErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::RemoteRejected => "remote_rejected",
            Self::Payload => "payload",
        }
    }
}

impl std::fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeliveryError {
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> DeliveryErrorKind {
        match self {
            Self::Transport { .. } | Self::Client(_) => DeliveryErrorKind::Transport,
            Self::RemoteRejected { .. } => DeliveryErrorKind::RemoteRejected,
            Self::InvalidPayload(_) | Self::Signing(_) => DeliveryErrorKind::Payload,
        }
    }

    /// Returns `true` if another attempt could plausibly succeed.
    ///
    /// Transport failures, 408, 429 and 5xx are retryable; other rejections
    /// and local payload errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::RemoteRejected { status } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            Self::InvalidPayload(_) | Self::Signing(_) | Self::Client(_) => false,
        }
    }

    /// Returns `true` if the attempt was abandoned because the timeout elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }
}
