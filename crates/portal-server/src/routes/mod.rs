//! API routes.
//!
//! Organized by audience:
//! - `collaborators` - public listing and multipart submission
//! - `innovators` - public listing and JSON submission
//! - `admin` - search, export, audit and review (admin session required)
//! - `auth` - session introspection
//!
//! Each route carries the rate limiter of its endpoint class.

mod admin;
mod auth;
mod collaborators;
mod innovators;

pub use admin::admin_routes;
pub use auth::auth_routes;
pub use collaborators::collaborator_routes;
pub use innovators::innovator_routes;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use portal_ratelimit::RateLimitType;
use portal_storage::PortalStorage;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::middleware::RateLimitLayer;
use crate::state::AppState;

/// Default and maximum page size of public listings.
pub const PUBLIC_DEFAULT_LIMIT: u32 = 10;
pub const PUBLIC_MAX_LIMIT: u32 = 50;

pub(crate) fn limiter(state: &AppState, kind: RateLimitType) -> RateLimitLayer {
    RateLimitLayer::new(state.limiters.clone(), kind)
}

/// Raw `page`/`limit` query parameters. Parsed leniently: unparseable values
/// fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Inline JSON form of a stored image, or `null` when the record has none
/// or the blob is gone.
pub(crate) async fn image_json(
    storage: &dyn PortalStorage,
    image_id: Option<&str>,
) -> ApiResult<Value> {
    let Some(id) = image_id else {
        return Ok(Value::Null);
    };
    Ok(match storage.read_image(id).await? {
        Some(image) => json!({
            "data": STANDARD.encode(&image.data),
            "type": image.content_type,
            "size": image.size,
        }),
        None => Value::Null,
    })
}
