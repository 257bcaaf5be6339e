use async_trait::async_trait;

use collegia_core::{Subscription, SubscriptionId, SubscriptionUpdate, TenantId};

use crate::error::RegistryError;

/// Persistence backend for subscription records.
///
/// Every lookup is keyed by tenant as well as id: a backend must report a
/// record owned by a different tenant exactly as it reports a missing one
/// (`None` / `false`). Implementations must be `Send + Sync` and safe for
/// concurrent access; they are responsible for serializing their own writes.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new subscription. The id is assumed to be fresh.
    async fn insert(&self, subscription: Subscription) -> Result<(), RegistryError>;

    /// Fetch a subscription owned by `tenant`.
    async fn get(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, RegistryError>;

    /// All subscriptions owned by `tenant`, oldest first.
    async fn list_by_tenant(&self, tenant: &TenantId) -> Result<Vec<Subscription>, RegistryError>;

    /// Active subscriptions owned by `tenant` whose event name equals `event`.
    async fn list_active_by_event(
        &self,
        tenant: &TenantId,
        event: &str,
    ) -> Result<Vec<Subscription>, RegistryError>;

    /// Atomically apply `update` to the subscription owned by `tenant`.
    /// Returns the updated record, or `None` if it does not exist.
    async fn update(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
        update: &SubscriptionUpdate,
    ) -> Result<Option<Subscription>, RegistryError>;

    /// Remove a subscription owned by `tenant`. Returns `true` if it existed.
    async fn remove(&self, tenant: &TenantId, id: &SubscriptionId) -> Result<bool, RegistryError>;
}
