pub mod event;
pub mod payload;
pub mod subscription;
pub mod types;

pub use event::Event;
pub use payload::{TEST_EVENT, WebhookPayload};
pub use subscription::{NewSubscription, Subscription, SubscriptionUpdate};
pub use types::{SubscriptionId, TenantId};
