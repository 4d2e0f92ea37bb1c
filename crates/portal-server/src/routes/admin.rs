//! Admin console endpoints. Every route requires an admin session and runs
//! under the admin rate limiter.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::HeaderMap,
    middleware::from_fn_with_state,
    response::Response,
    routing::{get, post},
};
use portal_auth::AdminAuth;
use portal_cache::{invalidate_admin_stats, invalidate_collaborators, invalidate_innovators};
use portal_core::{AuditAction, AuditEntity, PageRequest, Paginated, RecordStatus};
use portal_notifications::ReviewDecision;
use portal_ratelimit::RateLimitType;
use portal_storage::{EntityKind, QueryBuilder};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::limiter;
use crate::audit::{Actor, AuditQuery};
use crate::error::{ApiError, ApiResult};
use crate::export::{ExportFormat, collect_rows, export_response, to_values};
use crate::middleware::rate_limit;
use crate::state::AppState;

pub const ADMIN_DEFAULT_LIMIT: u32 = 20;
pub const ADMIN_MAX_LIMIT: u32 = 100;

pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin", get(search).post(export))
        .route("/api/admin/audit", get(audit_log))
        .route("/api/admin/{kind}/{id}/approve", post(approve))
        .route("/api/admin/{kind}/{id}/reject", post(reject))
        .route_layer(from_fn_with_state(
            limiter(state, RateLimitType::Admin),
            rate_limit,
        ))
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    q: Option<String>,
    status: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

fn parse_kind(kind: Option<&str>) -> ApiResult<EntityKind> {
    Ok(kind.unwrap_or_default().trim().parse::<EntityKind>()?)
}

/// Paged search over one entity kind.
async fn search(
    State(state): State<AppState>,
    _admin: AdminAuth,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Paginated<Value>>> {
    let Query(params) = params.map_err(|e| ApiError::validation(e.body_text()))?;
    let kind = parse_kind(Some(params.kind.as_deref().unwrap_or("collaborators")))?;
    let page = PageRequest::from_query(
        params.page.as_deref(),
        params.limit.as_deref(),
        ADMIN_DEFAULT_LIMIT,
        ADMIN_MAX_LIMIT,
    );

    let query = QueryBuilder::new(kind)
        .search(params.q.as_deref())
        .status(params.status.as_deref())?
        .offset(page.offset())
        .limit(page.limit as usize)
        .build();

    let (data, total) = match kind {
        EntityKind::Collaborators => {
            let result = state.storage.search_collaborators(&query).await?;
            (to_values(result.items)?, result.total)
        }
        EntityKind::Innovators => {
            let result = state.storage.search_innovators(&query).await?;
            (to_values(result.items)?, result.total)
        }
        EntityKind::Audit => {
            let result = state.storage.search_audit(&query).await?;
            (to_values(result.items)?, result.total)
        }
    };

    Ok(Json(Paginated::new(data, page, total)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    format: Option<String>,
    filters: Option<Value>,
}

async fn export(
    State(state): State<AppState>,
    admin: AdminAuth,
    headers: HeaderMap,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let kind = parse_kind(request.kind.as_deref())?;
    let format = ExportFormat::parse(request.format.as_deref())?;
    let filters = match request.filters {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(ApiError::validation("filters must be an object")),
    };

    let rows = collect_rows(&state.storage, kind, &filters).await?;

    let actor = Actor::new(&admin.user_id, &admin.email, &headers);
    state
        .audit
        .record_export(&actor, kind, rows.len(), &Value::Object(filters))
        .await;
    tracing::info!(kind = %kind, rows = rows.len(), user_id = %admin.user_id, "export generated");

    export_response(kind, format, rows, &admin.email)
}

async fn audit_log(
    State(state): State<AppState>,
    _admin: AdminAuth,
    params: Result<Query<AuditQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params.map_err(|e| ApiError::validation(e.body_text()))?;
    let page = state.audit.query(&params).await?;
    Ok(Json(json!({ "data": page.items, "total": page.total })))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewTarget {
    Collaborator,
    Innovator,
}

impl ReviewTarget {
    fn parse(kind: &str) -> ApiResult<Self> {
        match kind {
            "collaborators" => Ok(Self::Collaborator),
            "innovators" => Ok(Self::Innovator),
            other => Err(ApiError::invalid_type(other)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RejectBody {
    reason: Option<String>,
}

async fn approve(
    State(state): State<AppState>,
    admin: AdminAuth,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let target = ReviewTarget::parse(&kind)?;
    let actor = Actor::new(&admin.user_id, &admin.email, &headers);
    review(&state, &actor, target, &id, ReviewDecision::Approved, None)
        .await
        .map(Json)
}

async fn reject(
    State(state): State<AppState>,
    admin: AdminAuth,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let target = ReviewTarget::parse(&kind)?;
    let reason = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<RejectBody>(&body)
            .map_err(|e| ApiError::validation(format!("Invalid request body: {e}")))?
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
    };

    let actor = Actor::new(&admin.user_id, &admin.email, &headers);
    review(&state, &actor, target, &id, ReviewDecision::Rejected, reason)
        .await
        .map(Json)
}

/// Applies a review decision: status and visibility, audit entry, cache
/// invalidation and the applicant email.
async fn review(
    state: &AppState,
    actor: &Actor,
    target: ReviewTarget,
    id: &str,
    decision: ReviewDecision,
    reason: Option<String>,
) -> ApiResult<Value> {
    let (status, visible, action) = match decision {
        ReviewDecision::Approved => (RecordStatus::Approved, true, AuditAction::Approve),
        ReviewDecision::Rejected => (RecordStatus::Rejected, false, AuditAction::Reject),
    };
    let details = reason.as_ref().map(|r| json!({ "reason": r }));

    let record = match target {
        ReviewTarget::Collaborator => {
            let collaborator = state
                .storage
                .update_collaborator_status(id, status, visible)
                .await?;
            state
                .audit
                .record(actor, action, AuditEntity::Collaborator.as_str(), Some(id), details)
                .await;
            invalidate_collaborators(&state.cache);
            state
                .notifications
                .collaborator_reviewed(&collaborator, decision, reason.as_deref());
            serde_json::to_value(&collaborator)
        }
        ReviewTarget::Innovator => {
            let innovator = state
                .storage
                .update_innovator_status(id, status, visible)
                .await?;
            state
                .audit
                .record(actor, action, AuditEntity::Innovator.as_str(), Some(id), details)
                .await;
            invalidate_innovators(&state.cache);
            state
                .notifications
                .innovator_reviewed(&innovator, decision, reason.as_deref());
            serde_json::to_value(&innovator)
        }
    }
    .map_err(|e| ApiError::internal(e.to_string()))?;
    invalidate_admin_stats(&state.cache);

    tracing::info!(
        kind = ?target,
        id = %id,
        status = %status.as_str(),
        user_id = %actor.user_id,
        "review recorded"
    );
    Ok(record)
}
