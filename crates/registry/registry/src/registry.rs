use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use collegia_core::{NewSubscription, Subscription, SubscriptionId, SubscriptionUpdate, TenantId};

use crate::error::RegistryError;
use crate::store::SubscriptionStore;

/// Tenant-scoped CRUD over webhook subscriptions.
///
/// The registry validates input and stamps identity and timestamps; the
/// backing [`SubscriptionStore`] only persists. Callers are expected to have
/// already authorized the request for `tenant`.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionRegistry {
    /// Create a registry on top of the given backend.
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Register a new subscription for `tenant`.
    ///
    /// The subscription always starts active. Fails with
    /// [`RegistryError::Validation`] when the URL or event name is blank, in
    /// which case nothing is persisted.
    #[instrument(skip(self, input), fields(tenant = %tenant, event = %input.event))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: NewSubscription,
    ) -> Result<Subscription, RegistryError> {
        validate_url(&input.url)?;
        validate_event(&input.event)?;

        let now = Utc::now();
        let subscription = Subscription {
            id: SubscriptionId::generate(),
            tenant: tenant.clone(),
            url: input.url,
            event: input.event,
            secret: input.secret,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(subscription.clone()).await?;

        info!(
            subscription_id = %subscription.id,
            signed = subscription.is_signed(),
            "webhook subscription created"
        );
        Ok(subscription)
    }

    /// Fetch one subscription. Cross-tenant ids are reported as not found.
    pub async fn get(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
    ) -> Result<Subscription, RegistryError> {
        self.store
            .get(tenant, id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// List every subscription owned by `tenant`, oldest first.
    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<Subscription>, RegistryError> {
        self.store.list_by_tenant(tenant).await
    }

    /// Active subscriptions of `tenant` listening for exactly `event`.
    pub async fn list_active_for_event(
        &self,
        tenant: &TenantId,
        event: &str,
    ) -> Result<Vec<Subscription>, RegistryError> {
        let subscriptions = self.store.list_active_by_event(tenant, event).await?;
        debug!(
            tenant = %tenant,
            event,
            count = subscriptions.len(),
            "matched active subscriptions"
        );
        Ok(subscriptions)
    }

    /// Apply a partial update. URL and event, when present, must be non-blank.
    #[instrument(skip(self, update), fields(tenant = %tenant, subscription_id = %id))]
    pub async fn update(
        &self,
        tenant: &TenantId,
        id: &SubscriptionId,
        update: SubscriptionUpdate,
    ) -> Result<Subscription, RegistryError> {
        if let Some(url) = &update.url {
            validate_url(url)?;
        }
        if let Some(event) = &update.event {
            validate_event(event)?;
        }

        let updated = self
            .store
            .update(tenant, id, &update)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        info!(active = updated.active, "webhook subscription updated");
        Ok(updated)
    }

    /// Delete a subscription owned by `tenant`.
    #[instrument(skip(self), fields(tenant = %tenant, subscription_id = %id))]
    pub async fn delete(&self, tenant: &TenantId, id: &SubscriptionId) -> Result<(), RegistryError> {
        if self.store.remove(tenant, id).await? {
            info!("webhook subscription deleted");
            Ok(())
        } else {
            Err(RegistryError::NotFound(id.clone()))
        }
    }
}

fn validate_url(url: &str) -> Result<(), RegistryError> {
    if url.trim().is_empty() {
        return Err(RegistryError::Validation("url must not be empty".into()));
    }
    Ok(())
}

fn validate_event(event: &str) -> Result<(), RegistryError> {
    if event.trim().is_empty() {
        return Err(RegistryError::Validation(
            "event name must not be empty".into(),
        ));
    }
    Ok(())
}
