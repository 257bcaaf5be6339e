use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SubscriptionId, TenantId};

/// A tenant's registration to receive HTTP notifications for one event name.
///
/// `id` and `tenant` are fixed at creation. Only [`SubscriptionUpdate`] may
/// change the remaining fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: SubscriptionId,

    /// Tenant (college) that owns this subscription.
    pub tenant: TenantId,

    /// Endpoint that receives the HTTP POST.
    pub url: String,

    /// Exact event name this subscription listens for (e.g. `grade.posted`).
    pub event: String,

    /// Shared HMAC secret. Empty means deliveries are sent unsigned.
    #[serde(default)]
    pub secret: String,

    /// Inactive subscriptions are never selected for live events.
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Returns `true` when deliveries to this subscription carry a signature.
    pub fn is_signed(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Returns `true` if a live event for `tenant` named `event` should be
    /// delivered to this subscription.
    pub fn matches(&self, tenant: &TenantId, event: &str) -> bool {
        self.active && self.tenant == *tenant && self.event == event
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("tenant", &self.tenant)
            .field("url", &self.url)
            .field("event", &self.event)
            .field(
                "secret",
                &if self.secret.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for registering a new subscription.
///
/// New subscriptions always start active, so there is no `active` field.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewSubscription {
    pub url: String,
    pub event: String,
    #[serde(default)]
    pub secret: String,
}

impl NewSubscription {
    /// Create registration input for `url` listening to `event`, unsigned.
    #[must_use]
    pub fn new(url: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            event: event.into(),
            secret: String::new(),
        }
    }

    /// Set the shared signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }
}

impl std::fmt::Debug for NewSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewSubscription")
            .field("url", &self.url)
            .field("event", &self.event)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Partial update of a subscription. `None` fields are left unchanged.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub secret: Option<String>,
}

impl SubscriptionUpdate {
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Apply this update to `subscription`, bumping `updated_at`.
    ///
    /// Identity fields (`id`, `tenant`, `created_at`) are never touched.
    pub fn apply_to(&self, subscription: &mut Subscription) {
        if let Some(url) = &self.url {
            url.clone_into(&mut subscription.url);
        }
        if let Some(event) = &self.event {
            event.clone_into(&mut subscription.event);
        }
        if let Some(active) = self.active {
            subscription.active = active;
        }
        if let Some(secret) = &self.secret {
            secret.clone_into(&mut subscription.secret);
        }
        subscription.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for SubscriptionUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionUpdate")
            .field("url", &self.url)
            .field("event", &self.event)
            .field("active", &self.active)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Subscription {
        let now = Utc::now();
        Subscription {
            id: SubscriptionId::new("sub-1"),
            tenant: TenantId::from(42_u64),
            url: "https://example.test/hook".into(),
            event: "grade.posted".into(),
            secret: "s3cr3t".into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn matches_requires_tenant_event_and_active() {
        let mut sub = sample();
        let tenant = TenantId::from(42_u64);

        assert!(sub.matches(&tenant, "grade.posted"));
        assert!(!sub.matches(&tenant, "grade.updated"));
        assert!(!sub.matches(&TenantId::from(43_u64), "grade.posted"));

        sub.active = false;
        assert!(!sub.matches(&tenant, "grade.posted"));
    }

    #[test]
    fn event_match_is_exact() {
        let sub = sample();
        let tenant = TenantId::from(42_u64);
        assert!(!sub.matches(&tenant, "Grade.Posted"));
        assert!(!sub.matches(&tenant, "grade.posted "));
        assert!(!sub.matches(&tenant, "grade.*"));
    }

    #[test]
    fn update_leaves_identity_untouched() {
        let mut sub = sample();
        let before = sub.clone();

        SubscriptionUpdate::default()
            .url("https://other.test/hook")
            .active(false)
            .apply_to(&mut sub);

        assert_eq!(sub.id, before.id);
        assert_eq!(sub.tenant, before.tenant);
        assert_eq!(sub.created_at, before.created_at);
        assert_eq!(sub.url, "https://other.test/hook");
        assert_eq!(sub.event, before.event);
        assert_eq!(sub.secret, before.secret);
        assert!(!sub.active);
        assert!(sub.updated_at >= before.updated_at);
    }

    #[test]
    fn clearing_the_secret_makes_it_unsigned() {
        let mut sub = sample();
        assert!(sub.is_signed());
        SubscriptionUpdate::default().secret("").apply_to(&mut sub);
        assert!(!sub.is_signed());
    }

    #[test]
    fn debug_redacts_secrets() {
        let sub = sample();
        let debug = format!("{sub:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("s3cr3t"));

        let input = NewSubscription::new("https://example.test", "grade.posted")
            .with_secret("hunter2");
        assert!(!format!("{input:?}").contains("hunter2"));

        let update = SubscriptionUpdate::default().secret("hunter2");
        assert!(!format!("{update:?}").contains("hunter2"));
    }

    #[test]
    fn update_deserializes_partial_json() {
        let update: SubscriptionUpdate = serde_json::from_str(r#"{"active": false}"#).unwrap();
        assert_eq!(update.active, Some(false));
        assert!(update.url.is_none());
        assert!(update.event.is_none());
        assert!(update.secret.is_none());
    }
}
