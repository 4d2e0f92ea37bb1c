//! Session verification for the incubator portal.
//!
//! Sessions are issued elsewhere; this crate verifies them and exposes axum
//! extractors:
//!
//! - [`SessionAuth`]: any verified session.
//! - [`AdminAuth`]: a session holding an administrative role.
//!
//! Both reject with [`AuthError`], which renders as a `401 {code, message}`.

pub mod error;
pub mod extract;
pub mod session;

pub use error::AuthError;
pub use extract::{AdminAuth, AuthState, DEFAULT_SESSION_COOKIE, SessionAuth};
pub use session::{Session, SessionClaims, SessionVerifier};
