use async_trait::async_trait;
use dashmap::DashMap;

use collegia_core::{Subscription, SubscriptionId, SubscriptionUpdate, TenantId};
use collegia_registry::{RegistryError, SubscriptionStore};

/// In-memory [`SubscriptionStore`] backed by a [`DashMap`].
///
/// Records are keyed by id; tenant ownership is checked on every access so a
/// foreign tenant sees exactly what it would see for a missing id. Suitable
/// for tests, development, and single-process deployments.
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    data: DashMap<SubscriptionId, Subscription>,
}

impl MemorySubscriptionStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions across all tenants.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no subscriptions are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn collect_sorted(&self, filter: impl Fn(&Subscription) -> bool) -> Vec<Subscription> {
        let mut matched: Vec<Subscription> = self
            .data
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        matched
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn insert(&self, subscription: Subscription) -> Result<(), RegistryError> {
        match self.data.entry(subscription.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::Backend(format!(
                "duplicate subscription id: {}",
                subscription.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(subscription);
                Ok(())
            }
        }
    }

    async fn get(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, RegistryError> {
        Ok(self
            .data
            .get(id)
            .filter(|entry| entry.tenant == *tenant)
            .map(|entry| entry.value().clone()))
    }

    async fn list_by_tenant(&self, tenant: &TenantId) -> Result<Vec<Subscription>, RegistryError> {
        Ok(self.collect_sorted(|sub| sub.tenant == *tenant))
    }

    async fn list_active_by_event(
        &self,
        tenant: &TenantId,
        event: &str,
    ) -> Result<Vec<Subscription>, RegistryError> {
        Ok(self.collect_sorted(|sub| sub.matches(tenant, event)))
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
        update: &SubscriptionUpdate,
    ) -> Result<Option<Subscription>, RegistryError> {
        // The shard write lock is held for the whole read-modify-write.
        let Some(mut entry) = self.data.get_mut(id) else {
            return Ok(None);
        };
        if entry.tenant != *tenant {
            return Ok(None);
        }
        update.apply_to(entry.value_mut());
        Ok(Some(entry.value().clone()))
    }

    async fn remove(&self, tenant: &TenantId, id: &SubscriptionId) -> Result<bool, RegistryError> {
        Ok(self
            .data
            .remove_if(id, |_, sub| sub.tenant == *tenant)
            .is_some())
    }
}
