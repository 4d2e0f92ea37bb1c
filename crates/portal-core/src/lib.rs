pub mod error;
pub mod model;
pub mod pagination;
pub mod time;
pub mod upload;

pub use error::{CoreError, Result};
pub use model::{
    AdminRole, AuditAction, AuditEntity, AuditLogEntry, Collaborator, Image, Innovator, Media,
    MediaGroup, MediaLink, RecordStatus, generate_id,
};
pub use pagination::{PageRequest, Paginated, Pagination};
pub use time::{format_rfc3339, now_utc, parse_rfc3339};
pub use upload::{
    AllowedTypes, FileValidation, SizeLimits, UploadedFile, format_file_size, validate_file,
    validate_files,
};
