//! In-memory storage backend for the incubator portal.
//!
//! This crate provides an implementation of the [`PortalStorage`] trait from
//! `portal-storage` using [`dashmap::DashMap`] for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use portal_db_memory::InMemoryStorage;
//! use portal_storage::PortalStorage;
//!
//! let storage = InMemoryStorage::new();
//! let created = storage.create_collaborator(collaborator).await?;
//! ```

mod query;
pub mod storage;

pub use portal_storage::{PortalStorage, StorageError};
pub use storage::{InMemoryStorage, StorageCounts};

/// Creates a new shareable in-memory storage instance.
pub fn create_storage() -> portal_storage::DynStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
