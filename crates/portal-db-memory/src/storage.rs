use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use portal_core::{
    AuditLogEntry, Collaborator, Image, Innovator, Media, MediaGroup, MediaLink, RecordStatus,
};
use portal_storage::{
    CollaboratorMedia, EntityQuery, PortalStorage, QueryPage, StorageError,
};
use serde::Serialize;

use crate::query::{Sequenced, run_query};

/// In-memory portal storage backed by [`DashMap`].
///
/// Rows carry an insertion sequence so that records created within the same
/// timestamp still come back newest first.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    images: DashMap<String, Image>,
    media: DashMap<String, Media>,
    experience_links: DashMap<String, MediaLink>,
    machinery_links: DashMap<String, MediaLink>,
    collaborators: DashMap<String, Sequenced<Collaborator>>,
    innovators: DashMap<String, Sequenced<Innovator>>,
    audit: RwLock<Vec<AuditLogEntry>>,
    sequence: AtomicU64,
    faults: DashSet<String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call of `operation` (a [`PortalStorage`]
    /// method name such as `"create_media_link"`) fail with
    /// [`StorageError::Unavailable`] until [`Self::clear_faults`] is called.
    pub fn inject_fault(&self, operation: &str) {
        self.faults.insert(operation.to_string());
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Row counts per table, used by health output and tests.
    pub fn counts(&self) -> StorageCounts {
        StorageCounts {
            images: self.images.len(),
            media: self.media.len(),
            media_links: self.experience_links.len() + self.machinery_links.len(),
            collaborators: self.collaborators.len(),
            innovators: self.innovators.len(),
            audit_entries: self.audit.read().len(),
        }
    }

    fn check_fault(&self, operation: &str) -> Result<(), StorageError> {
        if self.faults.contains(operation) {
            tracing::debug!(operation, "injected storage fault");
            return Err(StorageError::unavailable(format!(
                "injected fault in {operation}"
            )));
        }
        Ok(())
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn links(&self, group: MediaGroup) -> &DashMap<String, MediaLink> {
        match group {
            MediaGroup::Experience => &self.experience_links,
            MediaGroup::Machinery => &self.machinery_links,
        }
    }

    fn links_for(&self, group: MediaGroup, collaborator_id: &str) -> Vec<MediaLink> {
        self.links(group)
            .iter()
            .filter(|link| link.collaborator_id == collaborator_id)
            .map(|link| link.value().clone())
            .collect()
    }
}

/// Number of stored rows per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCounts {
    pub images: usize,
    pub media: usize,
    pub media_links: usize,
    pub collaborators: usize,
    pub innovators: usize,
    pub audit_entries: usize,
}

#[async_trait]
impl PortalStorage for InMemoryStorage {
    async fn create_image(&self, image: Image) -> Result<Image, StorageError> {
        self.check_fault("create_image")?;
        if self.images.contains_key(&image.id) {
            return Err(StorageError::already_exists("image", &image.id));
        }
        self.images.insert(image.id.clone(), image.clone());
        Ok(image)
    }

    async fn read_image(&self, id: &str) -> Result<Option<Image>, StorageError> {
        self.check_fault("read_image")?;
        Ok(self.images.get(id).map(|image| image.value().clone()))
    }

    async fn delete_image(&self, id: &str) -> Result<(), StorageError> {
        self.check_fault("delete_image")?;
        self.images
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("image", id))
    }

    async fn create_media(&self, media: Media) -> Result<Media, StorageError> {
        self.check_fault("create_media")?;
        if self.media.contains_key(&media.id) {
            return Err(StorageError::already_exists("media", &media.id));
        }
        self.media.insert(media.id.clone(), media.clone());
        Ok(media)
    }

    async fn delete_media(&self, id: &str) -> Result<(), StorageError> {
        self.check_fault("delete_media")?;
        self.media
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("media", id))
    }

    async fn create_media_link(
        &self,
        group: MediaGroup,
        link: MediaLink,
    ) -> Result<MediaLink, StorageError> {
        self.check_fault("create_media_link")?;
        if !self.collaborators.contains_key(&link.collaborator_id) {
            return Err(StorageError::not_found("collaborator", &link.collaborator_id));
        }
        if !self.media.contains_key(&link.media) {
            return Err(StorageError::not_found("media", &link.media));
        }
        self.links(group).insert(link.id.clone(), link.clone());
        Ok(link)
    }

    async fn delete_media_link(&self, group: MediaGroup, id: &str) -> Result<(), StorageError> {
        self.check_fault("delete_media_link")?;
        self.links(group)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("media_link", id))
    }

    async fn media_links(&self, collaborator_id: &str) -> Result<CollaboratorMedia, StorageError> {
        self.check_fault("media_links")?;
        Ok(CollaboratorMedia {
            experience_media: self.links_for(MediaGroup::Experience, collaborator_id),
            machinery_media: self.links_for(MediaGroup::Machinery, collaborator_id),
        })
    }

    async fn create_collaborator(
        &self,
        collaborator: Collaborator,
    ) -> Result<Collaborator, StorageError> {
        self.check_fault("create_collaborator")?;
        if self.collaborators.contains_key(&collaborator.id) {
            return Err(StorageError::already_exists("collaborator", &collaborator.id));
        }
        let seq = self.next_sequence();
        self.collaborators.insert(
            collaborator.id.clone(),
            Sequenced::new(seq, collaborator.clone()),
        );
        Ok(collaborator)
    }

    async fn read_collaborator(&self, id: &str) -> Result<Option<Collaborator>, StorageError> {
        self.check_fault("read_collaborator")?;
        Ok(self.collaborators.get(id).map(|row| row.record.clone()))
    }

    async fn update_collaborator_status(
        &self,
        id: &str,
        status: RecordStatus,
        is_visible: bool,
    ) -> Result<Collaborator, StorageError> {
        self.check_fault("update_collaborator_status")?;
        let mut row = self
            .collaborators
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("collaborator", id))?;
        row.record.status = status;
        row.record.is_visible = is_visible;
        Ok(row.record.clone())
    }

    async fn delete_collaborator(&self, id: &str) -> Result<(), StorageError> {
        self.check_fault("delete_collaborator")?;
        self.collaborators
            .remove(id)
            .ok_or_else(|| StorageError::not_found("collaborator", id))?;
        self.experience_links
            .retain(|_, link| link.collaborator_id != id);
        self.machinery_links
            .retain(|_, link| link.collaborator_id != id);
        Ok(())
    }

    async fn find_collaborator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Collaborator>, StorageError> {
        self.check_fault("find_collaborator_by_email")?;
        Ok(self
            .collaborators
            .iter()
            .find(|row| {
                row.record
                    .email
                    .as_deref()
                    .is_some_and(|existing| existing.eq_ignore_ascii_case(email))
            })
            .map(|row| row.record.clone()))
    }

    async fn find_collaborator_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<Collaborator>, StorageError> {
        self.check_fault("find_collaborator_by_phone")?;
        Ok(self
            .collaborators
            .iter()
            .find(|row| row.record.primary_phone_number == phone)
            .map(|row| row.record.clone()))
    }

    async fn search_collaborators(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<Collaborator>, StorageError> {
        self.check_fault("search_collaborators")?;
        let rows: Vec<_> = self
            .collaborators
            .iter()
            .map(|row| row.value().clone())
            .collect();
        run_query(rows, query, |c| c.created_at)
    }

    async fn create_innovator(&self, innovator: Innovator) -> Result<Innovator, StorageError> {
        self.check_fault("create_innovator")?;
        if self.innovators.contains_key(&innovator.id) {
            return Err(StorageError::already_exists("innovator", &innovator.id));
        }
        let seq = self.next_sequence();
        self.innovators
            .insert(innovator.id.clone(), Sequenced::new(seq, innovator.clone()));
        Ok(innovator)
    }

    async fn read_innovator(&self, id: &str) -> Result<Option<Innovator>, StorageError> {
        self.check_fault("read_innovator")?;
        Ok(self.innovators.get(id).map(|row| row.record.clone()))
    }

    async fn update_innovator_status(
        &self,
        id: &str,
        status: RecordStatus,
        is_visible: bool,
    ) -> Result<Innovator, StorageError> {
        self.check_fault("update_innovator_status")?;
        let mut row = self
            .innovators
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("innovator", id))?;
        row.record.status = status;
        row.record.is_visible = is_visible;
        Ok(row.record.clone())
    }

    async fn find_innovator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Innovator>, StorageError> {
        self.check_fault("find_innovator_by_email")?;
        Ok(self
            .innovators
            .iter()
            .find(|row| row.record.email.eq_ignore_ascii_case(email))
            .map(|row| row.record.clone()))
    }

    async fn search_innovators(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<Innovator>, StorageError> {
        self.check_fault("search_innovators")?;
        let rows: Vec<_> = self
            .innovators
            .iter()
            .map(|row| row.value().clone())
            .collect();
        run_query(rows, query, |i| i.created_at)
    }

    async fn append_audit(&self, entry: AuditLogEntry) -> Result<(), StorageError> {
        self.check_fault("append_audit")?;
        self.audit.write().push(entry);
        Ok(())
    }

    async fn search_audit(
        &self,
        query: &EntityQuery,
    ) -> Result<QueryPage<AuditLogEntry>, StorageError> {
        self.check_fault("search_audit")?;
        let rows: Vec<_> = self
            .audit
            .read()
            .iter()
            .enumerate()
            .map(|(seq, entry)| Sequenced::new(seq as u64, entry.clone()))
            .collect();
        run_query(rows, query, |e| e.created_at)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check_fault("ping")
    }
}
