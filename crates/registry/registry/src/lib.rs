//! Webhook subscription registry for the Collegia webhook pipeline.
//!
//! [`SubscriptionRegistry`] owns every create/read/update/delete of
//! subscription records and enforces tenant scoping and input validation.
//! Persistence is delegated to a [`SubscriptionStore`] backend.

pub mod error;
pub mod registry;
pub mod store;
pub mod testing;

pub use error::RegistryError;
pub use registry::SubscriptionRegistry;
pub use store::SubscriptionStore;
