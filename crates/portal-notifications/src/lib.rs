//! Email notifications for the incubator portal.
//!
//! Applicants are emailed when a submission is received and again when it is
//! approved or rejected. Messages are rendered from [`PortalTemplate`]s by the
//! [`TemplateRenderer`] and handed to an [`EmailAdapter`]:
//!
//! - [`SmtpAdapter`] delivers through an SMTP relay.
//! - [`LogAdapter`] only logs, used when delivery is disabled.
//! - [`MemoryAdapter`] records messages for tests.
//!
//! [`NotificationService`] sends in the background so request handlers never
//! wait on the mail server.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod error;
pub mod service;
pub mod templates;

pub use adapters::{
    EmailAdapter, LogAdapter, MemoryAdapter, RenderedContent, SendResult, SentEmail, SmtpAdapter,
};
pub use catalog::PortalTemplate;
pub use config::{NotificationConfig, SmtpSettings};
pub use error::NotificationError;
pub use service::{NotificationService, ReviewDecision};
pub use templates::{Template, TemplateData, TemplateRenderer};
