//! Collaborator creation.
//!
//! A submission is checked in full before anything is written: required
//! fields, uniqueness of email and phone, then every file batch. Writes then
//! run as a saga. Each completed write registers a compensation, and a
//! failed write runs the registered compensations in reverse order so no
//! image, media blob or link outlives a collaborator that was never created.

use portal_core::{
    Collaborator, CoreError, FileValidation, Image, Media, MediaGroup, MediaLink, RecordStatus,
    UploadedFile, generate_id, now_utc, validate_file, validate_files,
};
use portal_storage::{PortalStorage, StorageError};

use crate::config::UploadConfig;
use crate::error::{ApiError, ApiResult};

/// A parsed collaborator submission.
#[derive(Debug, Clone, Default)]
pub struct CollaboratorSubmission {
    pub company_name: String,
    pub primary_phone_number: String,
    pub optional_phone_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub site: Option<String>,
    pub industrial_sector: String,
    pub specialization: String,
    pub experience_provided: Option<String>,
    pub machinery_and_equipment: Option<String>,
    pub image: Option<UploadedFile>,
    pub experience_media: Vec<UploadedFile>,
    pub machinery_media: Vec<UploadedFile>,
}

impl CollaboratorSubmission {
    /// Sets a text field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        let optional = || Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name {
            "companyName" => self.company_name = value.trim().to_string(),
            "primaryPhoneNumber" => self.primary_phone_number = value.trim().to_string(),
            "optionalPhoneNumber" => self.optional_phone_number = optional(),
            "email" => self.email = optional(),
            "location" => self.location = optional(),
            "site" => self.site = optional(),
            "industrialSector" => self.industrial_sector = value.trim().to_string(),
            "specialization" => self.specialization = value.trim().to_string(),
            "experienceProvided" => self.experience_provided = optional(),
            "machineryAndEquipment" => self.machinery_and_equipment = optional(),
            _ => {}
        }
    }

    fn validate_fields(&self) -> ApiResult<()> {
        for (name, value) in [
            ("companyName", &self.company_name),
            ("primaryPhoneNumber", &self.primary_phone_number),
            ("industrialSector", &self.industrial_sector),
            ("specialization", &self.specialization),
        ] {
            if value.is_empty() {
                return Err(ApiError::validation(format!("{name} is required")));
            }
        }
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                return Err(ApiError::validation("email is invalid"));
            }
        }
        Ok(())
    }

    fn validate_files(&self, uploads: &UploadConfig) -> ApiResult<()> {
        let image_rules = FileValidation::image().with_max_size(uploads.image_max_bytes);
        validate_file(self.image.as_ref(), &image_rules)?;

        let media_rules = FileValidation::media()
            .with_max_size(uploads.media_max_bytes)
            .with_max_files(uploads.media_max_files);
        for group in [MediaGroup::Experience, MediaGroup::Machinery] {
            validate_files(self.media(group), &media_rules).map_err(|e| match e {
                CoreError::InvalidFile { message } => {
                    ApiError::invalid_file(format!("{}: {}", group.label(), message))
                }
                other => ApiError::from(other),
            })?;
        }
        Ok(())
    }

    fn media(&self, group: MediaGroup) -> &[UploadedFile] {
        match group {
            MediaGroup::Experience => &self.experience_media,
            MediaGroup::Machinery => &self.machinery_media,
        }
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Undo step registered after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteImage(String),
    DeleteCollaborator(String),
    DeleteMedia(String),
    DeleteMediaLink(MediaGroup, String),
}

/// Writes with registered compensations.
pub struct Saga<'a> {
    storage: &'a dyn PortalStorage,
    compensations: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(storage: &'a dyn PortalStorage) -> Self {
        Self {
            storage,
            compensations: Vec::new(),
        }
    }

    pub fn register(&mut self, compensation: Compensation) {
        self.compensations.push(compensation);
    }

    pub fn pending(&self) -> &[Compensation] {
        &self.compensations
    }

    /// Runs every compensation, newest first. Failures are logged and the
    /// remaining steps still run.
    pub async fn compensate(self) {
        for step in self.compensations.into_iter().rev() {
            let result = match &step {
                Compensation::DeleteImage(id) => self.storage.delete_image(id).await,
                Compensation::DeleteCollaborator(id) => self.storage.delete_collaborator(id).await,
                Compensation::DeleteMedia(id) => self.storage.delete_media(id).await,
                Compensation::DeleteMediaLink(group, id) => {
                    self.storage.delete_media_link(*group, id).await
                }
            };
            match result {
                Ok(()) => tracing::debug!(step = ?step, "compensation applied"),
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::error!(step = ?step, error = %e, "compensation failed"),
            }
        }
    }
}

/// Validates `submission` and creates the collaborator with its image and
/// media. The collaborator starts pending and hidden.
pub async fn create_collaborator(
    storage: &dyn PortalStorage,
    submission: CollaboratorSubmission,
    uploads: &UploadConfig,
) -> ApiResult<Collaborator> {
    submission.validate_fields()?;

    if let Some(email) = &submission.email {
        if storage.find_collaborator_by_email(email).await?.is_some() {
            return Err(ApiError::email_exists());
        }
    }
    if storage
        .find_collaborator_by_phone(&submission.primary_phone_number)
        .await?
        .is_some()
    {
        return Err(ApiError::phone_exists());
    }

    submission.validate_files(uploads)?;

    let mut saga = Saga::new(storage);
    match write_collaborator(&mut saga, submission).await {
        Ok(collaborator) => Ok(collaborator),
        Err(e) => {
            tracing::warn!(
                error = %e,
                steps = saga.pending().len(),
                "collaborator creation failed, rolling back"
            );
            saga.compensate().await;
            Err(ApiError::internal(format!("collaborator creation failed: {e}")))
        }
    }
}

async fn write_collaborator(
    saga: &mut Saga<'_>,
    submission: CollaboratorSubmission,
) -> Result<Collaborator, StorageError> {
    let storage = saga.storage;

    let image_id = match submission.image {
        Some(file) => {
            let image = storage
                .create_image(Image {
                    id: generate_id(),
                    size: file.size(),
                    content_type: file.content_type,
                    data: file.data,
                })
                .await?;
            saga.register(Compensation::DeleteImage(image.id.clone()));
            Some(image.id)
        }
        None => None,
    };

    let collaborator = storage
        .create_collaborator(Collaborator {
            id: generate_id(),
            company_name: submission.company_name,
            primary_phone_number: submission.primary_phone_number,
            optional_phone_number: submission.optional_phone_number,
            email: submission.email,
            location: submission.location,
            site: submission.site,
            industrial_sector: submission.industrial_sector,
            specialization: submission.specialization,
            experience_provided: submission.experience_provided,
            machinery_and_equipment: submission.machinery_and_equipment,
            image_id,
            status: RecordStatus::Pending,
            is_visible: false,
            created_at: now_utc(),
        })
        .await?;
    saga.register(Compensation::DeleteCollaborator(collaborator.id.clone()));

    for (group, files) in [
        (MediaGroup::Experience, submission.experience_media),
        (MediaGroup::Machinery, submission.machinery_media),
    ] {
        for file in files {
            let media = storage
                .create_media(Media {
                    id: generate_id(),
                    size: file.size(),
                    content_type: file.content_type,
                    data: file.data,
                })
                .await?;
            saga.register(Compensation::DeleteMedia(media.id.clone()));

            let link = storage
                .create_media_link(
                    group,
                    MediaLink {
                        id: generate_id(),
                        media: media.id,
                        collaborator_id: collaborator.id.clone(),
                    },
                )
                .await?;
            saga.register(Compensation::DeleteMediaLink(group, link.id));
        }
    }

    Ok(collaborator)
}
