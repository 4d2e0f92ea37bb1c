use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use portal_cache::{CacheKeys, cached_query, invalidate_admin_stats, invalidate_innovators};
use portal_core::{Innovator, PageRequest, Paginated, RecordStatus, generate_id, now_utc};
use portal_ratelimit::RateLimitType;
use portal_storage::{EntityKind, PortalStorage, QueryBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{PUBLIC_DEFAULT_LIMIT, PUBLIC_MAX_LIMIT, PageParams, image_json, limiter};
use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit;
use crate::pipeline::looks_like_email;
use crate::state::AppState;

pub fn innovator_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/innovators/public",
            get(list_public).layer(from_fn_with_state(
                limiter(state, RateLimitType::Api),
                rate_limit,
            )),
        )
        .route(
            "/api/innovators",
            post(submit).layer(from_fn_with_state(
                limiter(state, RateLimitType::Submission),
                rate_limit,
            )),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InnovatorSubmission {
    name: String,
    email: String,
    phone: String,
    project_title: String,
    project_description: Option<String>,
    field: Option<String>,
}

impl InnovatorSubmission {
    fn into_innovator(self) -> ApiResult<Innovator> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.trim().to_string();
        let project_title = self.project_title.trim().to_string();

        for (field, value) in [
            ("name", &name),
            ("email", &email),
            ("phone", &phone),
            ("projectTitle", &project_title),
        ] {
            if value.is_empty() {
                return Err(ApiError::validation(format!("{field} is required")));
            }
        }
        if !looks_like_email(&email) {
            return Err(ApiError::validation("email is invalid"));
        }

        let optional =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(Innovator {
            id: generate_id(),
            name,
            email,
            phone,
            project_title,
            project_description: optional(self.project_description),
            field: optional(self.field),
            image_id: None,
            status: RecordStatus::Pending,
            is_visible: false,
            created_at: now_utc(),
        })
    }
}

async fn list_public(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Value>> {
    let page = PageRequest::from_query(
        params.page.as_deref(),
        params.limit.as_deref(),
        PUBLIC_DEFAULT_LIMIT,
        PUBLIC_MAX_LIMIT,
    );
    let key = CacheKeys::public_innovators(page.page, page.limit);
    let storage = state.storage.clone();

    let body = cached_query(&state.cache, &key, state.cache_ttl.public, || async move {
        let query = QueryBuilder::new(EntityKind::Innovators)
            .filter("status", &json!(RecordStatus::Approved.as_str()))?
            .filter("isVisible", &json!(true))?
            .offset(page.offset())
            .limit(page.limit as usize)
            .build();
        let result = storage.search_innovators(&query).await?;

        let mut data = Vec::with_capacity(result.items.len());
        for innovator in &result.items {
            data.push(public_view(storage.as_ref(), innovator).await?);
        }
        serde_json::to_value(Paginated::new(data, page, result.total))
            .map_err(|e| ApiError::internal(e.to_string()))
    })
    .await?;

    Ok(Json(body))
}

async fn public_view(storage: &dyn PortalStorage, i: &Innovator) -> ApiResult<Value> {
    let image = image_json(storage, i.image_id.as_deref()).await?;
    Ok(json!({
        "id": i.id,
        "name": i.name,
        "projectTitle": i.project_title,
        "projectDescription": i.project_description,
        "field": i.field,
        "imageId": i.image_id,
        "image": image,
    }))
}

async fn submit(
    State(state): State<AppState>,
    body: Result<Json<InnovatorSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(submission) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let innovator = submission.into_innovator()?;

    if state
        .storage
        .find_innovator_by_email(&innovator.email)
        .await?
        .is_some()
    {
        return Err(ApiError::email_exists());
    }

    let innovator = state.storage.create_innovator(innovator).await?;

    invalidate_innovators(&state.cache);
    invalidate_admin_stats(&state.cache);
    tracing::info!(innovator_id = %innovator.id, "innovator submitted");
    state.notifications.innovator_submitted(&innovator);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Innovator created successfully" })),
    ))
}
