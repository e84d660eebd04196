//! Persistence layer for the bridge.
//!
//! The orchestrator only sees the [`StorageGateway`] trait: an upgradable,
//! versioned store of session records. [`sqlite::SqliteStorage`] is the
//! production implementation.

pub mod gateway;
pub mod sqlite;

pub use {
    gateway::{SessionRecord, StorageGateway, UpgradeError},
    sqlite::SqliteStorage,
};
