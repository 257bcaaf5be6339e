mod store;

pub use store::MemorySubscriptionStore;
