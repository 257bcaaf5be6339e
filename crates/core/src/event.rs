use serde::{Deserialize, Serialize};

use crate::types::TenantId;

/// A named occurrence in the business domain, raised after a change commits.
///
/// Events are never persisted by the webhook pipeline. The payload is opaque:
/// it is forwarded to subscribers as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Tenant the event belongs to.
    pub tenant: TenantId,

    /// Event name, matched exactly against subscriptions.
    pub name: String,

    /// Event-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    #[must_use]
    pub fn new(
        tenant: impl Into<TenantId>,
        name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            name: name.into(),
            payload,
        }
    }
}
