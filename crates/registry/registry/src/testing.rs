use chrono::{Duration, Utc};

use collegia_core::{Subscription, SubscriptionId, SubscriptionUpdate, TenantId};

use crate::error::RegistryError;
use crate::store::SubscriptionStore;

fn record(tenant: &str, id: &str, event: &str, active: bool, age_secs: i64) -> Subscription {
    let created = Utc::now() - Duration::seconds(age_secs);
    Subscription {
        id: SubscriptionId::new(id),
        tenant: TenantId::new(tenant),
        url: format!("https://{tenant}.example.test/{id}"),
        event: event.to_owned(),
        secret: String::new(),
        active,
        created_at: created,
        updated_at: created,
    }
}

/// Run the full subscription store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if the backend fails an operation outright; assertion
/// failures panic.
pub async fn run_store_conformance_tests(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    test_get_missing(store).await?;
    test_insert_and_get(store).await?;
    test_cross_tenant_get_is_absent(store).await?;
    test_list_by_tenant_is_scoped_and_ordered(store).await?;
    test_list_active_by_event(store).await?;
    test_update(store).await?;
    test_cross_tenant_update_is_absent(store).await?;
    test_remove(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    let found = store
        .get(&TenantId::new("conf-missing"), &SubscriptionId::new("nope"))
        .await?;
    assert!(found.is_none(), "get on missing id should return None");
    Ok(())
}

async fn test_insert_and_get(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    let sub = record("conf-a", "insert-get", "grade.posted", true, 0);
    store.insert(sub.clone()).await?;
    let found = store.get(&sub.tenant, &sub.id).await?;
    assert_eq!(found, Some(sub));
    Ok(())
}

async fn test_cross_tenant_get_is_absent(
    store: &dyn SubscriptionStore,
) -> Result<(), RegistryError> {
    let sub = record("conf-owner", "cross-get", "grade.posted", true, 0);
    store.insert(sub.clone()).await?;
    let found = store.get(&TenantId::new("conf-intruder"), &sub.id).await?;
    assert!(found.is_none(), "cross-tenant get must look like a miss");
    Ok(())
}

async fn test_list_by_tenant_is_scoped_and_ordered(
    store: &dyn SubscriptionStore,
) -> Result<(), RegistryError> {
    store
        .insert(record("conf-list", "newer", "grade.posted", true, 10))
        .await?;
    store
        .insert(record("conf-list", "older", "attendance.frozen", false, 100))
        .await?;
    store
        .insert(record("conf-list-other", "foreign", "grade.posted", true, 50))
        .await?;

    let listed = store.list_by_tenant(&TenantId::new("conf-list")).await?;
    let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["older", "newer"], "list should be tenant-scoped, oldest first");
    Ok(())
}

async fn test_list_active_by_event(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    let tenant = TenantId::new("conf-active");
    store
        .insert(record("conf-active", "hit", "grade.posted", true, 0))
        .await?;
    store
        .insert(record("conf-active", "inactive", "grade.posted", false, 0))
        .await?;
    store
        .insert(record("conf-active", "other-event", "grade.updated", true, 0))
        .await?;
    store
        .insert(record("conf-active-other", "other-tenant", "grade.posted", true, 0))
        .await?;

    let matched = store.list_active_by_event(&tenant, "grade.posted").await?;
    let ids: Vec<&str> = matched.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["hit"]);

    let none = store.list_active_by_event(&tenant, "grade").await?;
    assert!(none.is_empty(), "event names must match exactly");
    Ok(())
}

async fn test_update(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    let sub = record("conf-update", "to-update", "grade.posted", true, 0);
    store.insert(sub.clone()).await?;

    let update = SubscriptionUpdate::default()
        .url("https://new.example.test/hook")
        .active(false)
        .secret("rotated");
    let updated = store
        .update(&sub.tenant, &sub.id, &update)
        .await?
        .expect("existing subscription should update");

    assert_eq!(updated.id, sub.id);
    assert_eq!(updated.tenant, sub.tenant);
    assert_eq!(updated.url, "https://new.example.test/hook");
    assert_eq!(updated.event, "grade.posted");
    assert_eq!(updated.secret, "rotated");
    assert!(!updated.active);

    let reread = store.get(&sub.tenant, &sub.id).await?;
    assert_eq!(reread, Some(updated));

    let missing = store
        .update(&sub.tenant, &SubscriptionId::new("absent"), &update)
        .await?;
    assert!(missing.is_none(), "update on missing id should return None");
    Ok(())
}

async fn test_cross_tenant_update_is_absent(
    store: &dyn SubscriptionStore,
) -> Result<(), RegistryError> {
    let sub = record("conf-update-owner", "guarded", "grade.posted", true, 0);
    store.insert(sub.clone()).await?;

    let update = SubscriptionUpdate::default().active(false);
    let result = store
        .update(&TenantId::new("conf-update-intruder"), &sub.id, &update)
        .await?;
    assert!(result.is_none(), "cross-tenant update must look like a miss");

    let untouched = store.get(&sub.tenant, &sub.id).await?;
    assert_eq!(untouched.map(|s| s.active), Some(true));
    Ok(())
}

async fn test_remove(store: &dyn SubscriptionStore) -> Result<(), RegistryError> {
    let sub = record("conf-remove", "to-remove", "grade.posted", true, 0);
    store.insert(sub.clone()).await?;

    let removed = store.remove(&TenantId::new("conf-remove-intruder"), &sub.id).await?;
    assert!(!removed, "cross-tenant remove must not delete");

    let removed = store.remove(&sub.tenant, &sub.id).await?;
    assert!(removed, "remove should return true for existing subscription");
    assert!(store.get(&sub.tenant, &sub.id).await?.is_none());

    let removed = store.remove(&sub.tenant, &sub.id).await?;
    assert!(!removed, "remove on missing id should return false");
    Ok(())
}
