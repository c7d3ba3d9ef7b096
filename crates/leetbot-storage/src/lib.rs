//! # leetbot-storage
//!
//! Tiered task storage and user subscriptions.
//!
//! - [`FileCache`]: fast tier, one JSON file per day
//! - [`SqliteStore`]: durable tier for tasks and users
//! - [`StorageController`]: the tier-ordering policy over both

pub mod cache;
pub mod controller;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod store;

pub use cache::FileCache;
pub use controller::StorageController;
pub use store::SqliteStore;
