//! Validation of uploaded files.
//!
//! Limits and MIME allow-lists are expressed as [`FileValidation`] rules.
//! Validation failures are returned as [`CoreError::InvalidFile`] with a
//! message that is safe to show to the submitter.

use bytes::Bytes;

use crate::error::{CoreError, Result};

const MB: usize = 1024 * 1024;

/// Default per-file size limits in bytes.
pub struct SizeLimits;

impl SizeLimits {
    pub const IMAGE: usize = 5 * MB;
    pub const DOCUMENT: usize = 10 * MB;
    pub const VIDEO: usize = 100 * MB;
    pub const MEDIA: usize = 50 * MB;
    pub const DEFAULT: usize = 10 * MB;
}

/// MIME type allow-lists.
pub struct AllowedTypes;

impl AllowedTypes {
    pub const IMAGE: &'static [&'static str] = &[
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
    ];
    pub const DOCUMENT: &'static [&'static str] = &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ];
    pub const VIDEO: &'static [&'static str] = &[
        "video/mp4",
        "video/mpeg",
        "video/quicktime",
        "video/x-msvideo",
    ];
    pub const MEDIA: &'static [&'static str] = &[
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
        "video/mp4",
        "video/mpeg",
    ];
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Validation rules for a single file or a batch of files.
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub max_size: usize,
    /// Empty means every type is accepted.
    pub allowed_types: Vec<String>,
    pub required: bool,
    pub max_files: usize,
}

impl Default for FileValidation {
    fn default() -> Self {
        Self {
            max_size: SizeLimits::DEFAULT,
            allowed_types: Vec::new(),
            required: false,
            max_files: 10,
        }
    }
}

impl FileValidation {
    /// Rules for profile images.
    pub fn image() -> Self {
        Self {
            max_size: SizeLimits::IMAGE,
            allowed_types: to_owned_list(AllowedTypes::IMAGE),
            ..Self::default()
        }
    }

    /// Rules for collaborator media batches.
    pub fn media() -> Self {
        Self {
            max_size: SizeLimits::MEDIA,
            allowed_types: to_owned_list(AllowedTypes::MEDIA),
            ..Self::default()
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Upper bound on the combined size of a batch.
    pub fn max_total_size(&self) -> usize {
        self.max_size.saturating_mul(self.max_files)
    }
}

fn to_owned_list(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| (*t).to_string()).collect()
}

/// Validates a single, possibly absent, file.
pub fn validate_file(file: Option<&UploadedFile>, rules: &FileValidation) -> Result<()> {
    let Some(file) = file else {
        if rules.required {
            return Err(CoreError::invalid_file("File is required"));
        }
        return Ok(());
    };

    if file.size() > rules.max_size {
        return Err(CoreError::invalid_file(format!(
            "File size exceeds maximum limit of {}",
            format_megabytes(rules.max_size)
        )));
    }

    if !rules.allowed_types.is_empty() && !rules.allowed_types.contains(&file.content_type) {
        return Err(CoreError::invalid_file(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            file.content_type,
            rules.allowed_types.join(", ")
        )));
    }

    Ok(())
}

/// Validates a batch: file count, each file, then the aggregate size.
pub fn validate_files(files: &[UploadedFile], rules: &FileValidation) -> Result<()> {
    if files.len() > rules.max_files {
        return Err(CoreError::invalid_file(format!(
            "Maximum {} files allowed",
            rules.max_files
        )));
    }

    for (index, file) in files.iter().enumerate() {
        if let Err(CoreError::InvalidFile { message }) = validate_file(Some(file), rules) {
            return Err(CoreError::invalid_file(format!(
                "File {}: {}",
                index + 1,
                message
            )));
        }
    }

    let total: usize = files.iter().map(UploadedFile::size).sum();
    let max_total = rules.max_total_size();
    if total > max_total {
        return Err(CoreError::invalid_file(format!(
            "Total file size exceeds maximum limit of {}",
            format_megabytes(max_total)
        )));
    }

    Ok(())
}

fn format_megabytes(bytes: usize) -> String {
    format!("{:.1}MB", bytes as f64 / MB as f64)
}

/// Formats a byte count for display, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
