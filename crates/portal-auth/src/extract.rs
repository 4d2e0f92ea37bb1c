//! Session and admin extractors.
//!
//! ```ignore
//! async fn handler(admin: AdminAuth) -> String {
//!     format!("hello {}", admin.email)
//! }
//! ```
//!
//! The application state must provide an [`AuthState`] through `FromRef`.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use portal_core::AdminRole;

use crate::error::AuthError;
use crate::session::{Session, SessionVerifier};

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "portal_session";

/// State required by the session extractors.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<SessionVerifier>,
    pub cookie_name: String,
    /// Roles that grant access to admin endpoints.
    pub admin_roles: Vec<AdminRole>,
}

impl AuthState {
    pub fn new(verifier: Arc<SessionVerifier>) -> Self {
        Self {
            verifier,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            admin_roles: AdminRole::ALL.to_vec(),
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_admin_roles(mut self, roles: Vec<AdminRole>) -> Self {
        self.admin_roles = roles;
        self
    }
}

/// A verified session of any role.
#[derive(Debug, Clone)]
pub struct SessionAuth(pub Session);

impl<S> FromRequestParts<S> for SessionAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts, &auth_state.cookie_name))
            .ok_or_else(|| AuthError::unauthorized("Unauthorized"))?;

        let session = auth_state.verifier.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "session verification failed");
            e
        })?;

        Ok(Self(session))
    }
}

/// A verified session holding one of the configured admin roles.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user_id: String,
    pub email: String,
    pub role: AdminRole,
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionAuth(session) = SessionAuth::from_request_parts(parts, state).await?;
        let auth_state = AuthState::from_ref(state);

        let role = session
            .admin_role()
            .filter(|role| auth_state.admin_roles.contains(role))
            .ok_or_else(|| {
                tracing::debug!(
                    user_id = %session.user_id,
                    role = %session.role,
                    "admin access denied: missing admin role"
                );
                AuthError::unauthorized("Unauthorized")
            })?;

        Ok(Self {
            user_id: session.user_id,
            email: session.email,
            role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

fn cookie_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let cookie_header = parts.headers.get(COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        let value = value.trim();
        (name.trim() == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionClaims;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn state() -> AuthState {
        AuthState::new(Arc::new(SessionVerifier::new("secret")))
    }

    fn token(state: &AuthState, role: &str) -> String {
        state
            .verifier
            .issue(&SessionClaims::new(
                "u1",
                "staff@center.ly",
                role,
                time::Duration::hours(1),
            ))
            .unwrap()
    }

    fn app(state: AuthState) -> Router {
        Router::new()
            .route(
                "/admin",
                get(|admin: AdminAuth| async move { admin.role.to_string() }),
            )
            .route(
                "/session",
                get(|SessionAuth(session): SessionAuth| async move { session.email }),
            )
            .with_state(state)
    }

    async fn call(app: Router, path: &str, header: Option<(&str, String)>) -> StatusCode {
        let mut request = Request::builder().uri(path);
        if let Some((name, value)) = header {
            request = request.header(name, value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_admin_with_bearer() {
        let state = state();
        let token = token(&state, "REQUEST_REVIEWER");
        let status = call(
            app(state),
            "/admin",
            Some(("authorization", format!("Bearer {token}"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_with_cookie() {
        let state = state();
        let token = token(&state, "NEWS_EDITOR");
        let status = call(
            app(state),
            "/admin",
            Some(("cookie", format!("theme=dark; portal_session={token}"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_and_wrong_role_are_unauthorized() {
        let state = state();
        assert_eq!(
            call(app(state.clone()), "/admin", None).await,
            StatusCode::UNAUTHORIZED
        );

        let user_token = token(&state, "USER");
        let header = Some(("authorization", format!("Bearer {user_token}")));
        assert_eq!(
            call(app(state.clone()), "/admin", header.clone()).await,
            StatusCode::UNAUTHORIZED
        );
        // Any verified session passes the plain session extractor.
        assert_eq!(call(app(state), "/session", header).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_restricted_admin_roles() {
        let state = state().with_admin_roles(vec![AdminRole::GeneralManager]);
        let token = token(&state, "NEWS_EDITOR");
        let status = call(
            app(state),
            "/admin",
            Some(("authorization", format!("Bearer {token}"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
