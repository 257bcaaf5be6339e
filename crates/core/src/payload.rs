use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::event::Event;

/// Event name carried by synthetic test deliveries.
pub const TEST_EVENT: &str = "test";

const TEST_MESSAGE: &str = "This is a test webhook delivery. If you can read this, your endpoint is reachable.";

/// The JSON envelope POSTed to subscribers.
///
/// ```json
/// {"data": {...}, "event": "grade.posted", "timestamp": "2026-10-19T12:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event name (`"test"` for test deliveries).
    pub event: String,

    /// Event-specific data, forwarded untouched.
    pub data: serde_json::Value,

    /// When the envelope was built, RFC3339 in UTC.
    #[serde(serialize_with = "rfc3339_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    /// Build the envelope for a live domain event.
    #[must_use]
    pub fn for_event(event: &Event) -> Self {
        Self {
            event: event.name.clone(),
            data: event.payload.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Build the synthetic envelope used to probe a subscriber endpoint.
    #[must_use]
    pub fn test() -> Self {
        Self {
            event: TEST_EVENT.to_owned(),
            data: serde_json::json!({ "message": TEST_MESSAGE }),
            timestamp: Utc::now(),
        }
    }
}

fn rfc3339_seconds<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}
