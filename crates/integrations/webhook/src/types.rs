use std::time::Duration;

/// Outcome of a delivery the remote endpoint accepted (status below 400).
///
/// The response body is discarded; only the status and timing are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// HTTP status code returned by the endpoint.
    pub status_code: u16,

    /// Wall-clock time from sending the request to receiving the status line.
    pub elapsed: Duration,
}

impl DeliveryReceipt {
    #[must_use]
    pub fn new(status_code: u16, elapsed: Duration) -> Self {
        Self {
            status_code,
            elapsed,
        }
    }
}
