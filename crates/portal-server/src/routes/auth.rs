use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use portal_auth::{Session, SessionAuth};
use portal_ratelimit::RateLimitType;

use super::limiter;
use crate::middleware::rate_limit;
use crate::state::AppState;

pub fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/api/auth/session",
        get(session).layer(from_fn_with_state(
            limiter(state, RateLimitType::Auth),
            rate_limit,
        )),
    )
}

/// The caller's verified session.
async fn session(SessionAuth(session): SessionAuth) -> Json<Session> {
    Json(session)
}
