//! # questhub-database
//!
//! Storage traits consumed by the achievement batch, their PostgreSQL
//! implementations, connection management, migrations, and an in-memory
//! store with the same semantics.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AchievementStore, UnlockStore, UserMetricStore};
