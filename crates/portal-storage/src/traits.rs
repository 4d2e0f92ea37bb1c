//! The storage contract implemented by every portal backend.

use async_trait::async_trait;
use portal_core::{
    AuditLogEntry, Collaborator, Image, Innovator, Media, MediaGroup, MediaLink, RecordStatus,
};
use serde::Serialize;

use crate::error::StorageError;
use crate::query::{EntityQuery, QueryPage};

/// Media links of one collaborator, by group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorMedia {
    pub experience_media: Vec<MediaLink>,
    pub machinery_media: Vec<MediaLink>,
}

impl CollaboratorMedia {
    pub fn group(&self, group: MediaGroup) -> &[MediaLink] {
        match group {
            MediaGroup::Experience => &self.experience_media,
            MediaGroup::Machinery => &self.machinery_media,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.experience_media.is_empty() && self.machinery_media.is_empty()
    }
}

/// Storage operations used by the portal.
///
/// Search methods return rows ordered by `createdAt` descending. Deleting a
/// collaborator also removes its media links.
#[async_trait]
pub trait PortalStorage: Send + Sync {
    // ==================== Blobs ====================

    async fn create_image(&self, image: Image) -> Result<Image, StorageError>;

    async fn read_image(&self, id: &str) -> Result<Option<Image>, StorageError>;

    async fn delete_image(&self, id: &str) -> Result<(), StorageError>;

    async fn create_media(&self, media: Media) -> Result<Media, StorageError>;

    async fn delete_media(&self, id: &str) -> Result<(), StorageError>;

    async fn create_media_link(
        &self,
        group: MediaGroup,
        link: MediaLink,
    ) -> Result<MediaLink, StorageError>;

    async fn delete_media_link(&self, group: MediaGroup, id: &str) -> Result<(), StorageError>;

    async fn media_links(&self, collaborator_id: &str) -> Result<CollaboratorMedia, StorageError>;

    // ==================== Collaborators ====================

    async fn create_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError>;

    async fn read_collaborator(&self, id: &str) -> Result<Option<Collaborator>, StorageError>;

    /// Sets review status and visibility.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the collaborator does not exist.
    async fn update_collaborator_status(
        &self,
        id: &str,
        status: RecordStatus,
        is_visible: bool,
    ) -> Result<Collaborator, StorageError>;

    async fn delete_collaborator(&self, id: &str) -> Result<(), StorageError>;

    async fn find_collaborator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Collaborator>, StorageError>;

    async fn find_collaborator_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<Collaborator>, StorageError>;

    async fn search_collaborators(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<Collaborator>, StorageError>;

    // ==================== Innovators ====================

    async fn create_innovator(&self, innovator: Innovator) -> Result<Innovator, StorageError>;

    async fn read_innovator(&self, id: &str) -> Result<Option<Innovator>, StorageError>;

    async fn update_innovator_status(
        &self,
        id: &str,
        status: RecordStatus,
        is_visible: bool,
    ) -> Result<Innovator, StorageError>;

    async fn find_innovator_by_email(&self, email: &str)
    -> Result<Option<Innovator>, StorageError>;

    async fn search_innovators(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<Innovator>, StorageError>;

    // ==================== Audit ====================

    /// Appends an audit entry. Entries are never updated or removed.
    async fn append_audit(&self, entry: AuditLogEntry) -> Result<(), StorageError>;

    async fn search_audit(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<AuditLogEntry>, StorageError>;

    // ==================== Health ====================

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}
