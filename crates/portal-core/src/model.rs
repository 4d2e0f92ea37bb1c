//! Domain records managed by the portal.
//!
//! Records serialize in camelCase so that the JSON produced for listings and
//! exports matches the field names used by the portal front end.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::CoreError;

/// Generates a new random record identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Record Status
// =============================================================================

/// Review status shared by collaborators and innovators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::invalid_status(s))
    }
}

// =============================================================================
// Admin Roles
// =============================================================================

/// Roles that grant access to the administrative console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    GeneralManager,
    NewsEditor,
    RequestReviewer,
}

impl AdminRole {
    pub const ALL: [AdminRole; 3] = [
        Self::GeneralManager,
        Self::NewsEditor,
        Self::RequestReviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralManager => "GENERAL_MANAGER",
            Self::NewsEditor => "NEWS_EDITOR",
            Self::RequestReviewer => "REQUEST_REVIEWER",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CoreError::invalid_role(s))
    }
}

// =============================================================================
// Blobs
// =============================================================================

/// Stored profile image.
#[derive(Debug, Clone)]
pub struct Image {
    pub id: String,
    pub data: Bytes,
    pub content_type: String,
    pub size: usize,
}

/// Stored media blob attached to a collaborator.
#[derive(Debug, Clone)]
pub struct Media {
    pub id: String,
    pub data: Bytes,
    pub content_type: String,
    pub size: usize,
}

/// Which media group of a collaborator a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaGroup {
    Experience,
    Machinery,
}

impl MediaGroup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Experience => "Experience media",
            Self::Machinery => "Machinery media",
        }
    }
}

/// Relation between a collaborator and one media blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLink {
    pub id: String,
    /// Referenced media blob id.
    pub media: String,
    pub collaborator_id: String,
}

// =============================================================================
// Collaborator
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
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
    pub image_id: Option<String>,
    pub status: RecordStatus,
    pub is_visible: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Collaborator {
    /// Publicly listed collaborators are approved and visible.
    pub fn is_public(&self) -> bool {
        self.status == RecordStatus::Approved && self.is_visible
    }
}

// =============================================================================
// Innovator
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Innovator {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub project_title: String,
    pub project_description: Option<String>,
    pub field: Option<String>,
    pub image_id: Option<String>,
    pub status: RecordStatus,
    pub is_visible: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Innovator {
    pub fn is_public(&self) -> bool {
        self.status == RecordStatus::Approved && self.is_visible
    }
}

// =============================================================================
// Audit Log
// =============================================================================

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    Create,
    Approve,
    Reject,
    Export,
    PasswordChange,
}

impl AuditAction {
    pub const ALL: [AuditAction; 7] = [
        Self::Login,
        Self::Logout,
        Self::Create,
        Self::Approve,
        Self::Reject,
        Self::Export,
        Self::PasswordChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::Create => "CREATE",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::Export => "EXPORT",
            Self::PasswordChange => "PASSWORD_CHANGE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::invalid_action(s))
    }
}

/// Well-known audited entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEntity {
    Auth,
    Collaborator,
    Innovator,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Collaborator => "COLLABORATOR",
            Self::Innovator => "INNOVATOR",
        }
    }
}

/// Immutable audit record. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AuditLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        user_email: impl Into<String>,
        action: AuditAction,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            user_id: user_id.into(),
            user_email: user_email.into(),
            action,
            entity: entity.into(),
            entity_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_source(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}
