use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use portal_ratelimit::{RateLimitType, RateLimited, RateLimiters, client_identifier};
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

// Adds or propagates an X-Request-Id header
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = match req.headers().get(&header_name) {
        Some(value) => value.clone(),
        None => match HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            Ok(value) => value,
            Err(_) => return next.run(req).await,
        },
    };

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

/// State of one rate limit layer: the registry plus the endpoint class it
/// enforces.
#[derive(Clone)]
pub struct RateLimitLayer {
    pub limiters: Arc<RateLimiters>,
    pub kind: RateLimitType,
}

impl RateLimitLayer {
    pub fn new(limiters: Arc<RateLimiters>, kind: RateLimitType) -> Self {
        Self { limiters, kind }
    }
}

/// Rejection for a request over its limit.
#[derive(Debug)]
pub struct RateLimitError {
    pub rejection: RateLimited,
}

impl RateLimitError {
    /// Whole seconds until the next request may pass. A zero rounds up to
    /// the default of 60.
    pub fn retry_after_secs(&self) -> u64 {
        match self.rejection.ms_before_next.saturating_add(500) / 1000 {
            0 => 60,
            secs => secs,
        }
    }
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_secs();
        let reset = i64::try_from(self.rejection.ms_before_next)
            .ok()
            .and_then(|ms| OffsetDateTime::now_utc().checked_add(time::Duration::milliseconds(ms)));

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.rejection.limit));
        headers.insert(
            X_RATELIMIT_REMAINING,
            HeaderValue::from(self.rejection.remaining_points),
        );
        if let Some(value) = reset
            .and_then(|reset| reset.format(&Rfc3339).ok())
            .and_then(|s| HeaderValue::from_str(&s).ok())
        {
            headers.insert(X_RATELIMIT_RESET, value);
        }

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            Json(json!({
                "code": "RATE_LIMITED",
                "error": "Too many requests",
                "retryAfter": retry_after,
            })),
        )
            .into_response()
    }
}

/// Consumes one point from the layer's limiter for the calling client.
///
/// The client is identified by the first `x-forwarded-for` entry. Requests
/// without one share the anonymous bucket.
pub async fn rate_limit(
    State(layer): State<RateLimitLayer>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    let forwarded_for = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok());
    let identifier = client_identifier(forwarded_for);

    match layer.limiters.consume(layer.kind, &identifier) {
        Ok(grant) => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(grant.limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(grant.remaining_points));
            Ok(response)
        }
        Err(rejection) => {
            tracing::warn!(
                limiter = %layer.kind,
                client = %identifier,
                ms_before_next = rejection.ms_before_next,
                "rate limit exceeded"
            );
            Err(RateLimitError { rejection })
        }
    }
}
