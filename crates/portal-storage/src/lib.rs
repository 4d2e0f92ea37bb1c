//! # portal-storage
//!
//! Storage abstraction layer for the incubator portal.
//!
//! This crate defines the [`PortalStorage`] trait, its error type and the
//! typed query builder used by admin search and export. Backends live in
//! separate crates.
//!
//! ```ignore
//! use portal_storage::{EntityKind, PortalStorage, QueryBuilder};
//!
//! let query = QueryBuilder::new(EntityKind::Collaborators)
//!     .search(Some("acme"))
//!     .status(Some("APPROVED"))?
//!     .limit(20)
//!     .build();
//! let page = storage.search_collaborators(&query).await?;
//! ```

mod error;
pub mod query;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use query::{EntityKind, EntityQuery, QueryBuilder, QueryFilter, QueryPage};
pub use traits::{CollaboratorMedia, PortalStorage};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable storage trait object.
pub type DynStorage = std::sync::Arc<dyn PortalStorage>;
