use axum::{
    Json, Router,
    extract::{
        Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use portal_cache::{CacheKeys, cached_query, invalidate_admin_stats, invalidate_collaborators};
use portal_core::{Collaborator, PageRequest, Paginated, RecordStatus, UploadedFile};
use portal_ratelimit::RateLimitType;
use portal_storage::{EntityKind, PortalStorage, QueryBuilder};
use serde_json::{Value, json};

use super::{PUBLIC_DEFAULT_LIMIT, PUBLIC_MAX_LIMIT, PageParams, image_json, limiter};
use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit;
use crate::pipeline::{CollaboratorSubmission, create_collaborator};
use crate::state::AppState;

pub fn collaborator_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/collaborators/public",
            get(list_public).layer(from_fn_with_state(
                limiter(state, RateLimitType::Api),
                rate_limit,
            )),
        )
        .route(
            "/api/collaborators",
            post(submit).layer(from_fn_with_state(
                limiter(state, RateLimitType::Submission),
                rate_limit,
            )),
        )
}

/// Approved and visible collaborators, newest first. Served from the cache
/// while the page is fresh.
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
    let key = CacheKeys::public_collaborators(page.page, page.limit);
    let storage = state.storage.clone();

    let body = cached_query(&state.cache, &key, state.cache_ttl.public, || async move {
        let query = QueryBuilder::new(EntityKind::Collaborators)
            .filter("status", &json!(RecordStatus::Approved.as_str()))?
            .filter("isVisible", &json!(true))?
            .offset(page.offset())
            .limit(page.limit as usize)
            .build();
        let result = storage.search_collaborators(&query).await?;

        let mut data = Vec::with_capacity(result.items.len());
        for collaborator in &result.items {
            data.push(public_view(storage.as_ref(), collaborator).await?);
        }
        serde_json::to_value(Paginated::new(data, page, result.total))
            .map_err(|e| ApiError::internal(e.to_string()))
    })
    .await?;

    Ok(Json(body))
}

async fn public_view(storage: &dyn PortalStorage, c: &Collaborator) -> ApiResult<Value> {
    let image = image_json(storage, c.image_id.as_deref()).await?;
    Ok(json!({
        "id": c.id,
        "companyName": c.company_name,
        "imageId": c.image_id,
        "location": c.location,
        "site": c.site,
        "industrialSector": c.industrial_sector,
        "specialization": c.specialization,
        "image": image,
    }))
}

async fn submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let submission = read_submission(&mut multipart).await?;

    let collaborator =
        create_collaborator(state.storage.as_ref(), submission, &state.uploads).await?;

    invalidate_collaborators(&state.cache);
    invalidate_admin_stats(&state.cache);
    tracing::info!(collaborator_id = %collaborator.id, "collaborator submitted");
    state.notifications.collaborator_submitted(&collaborator);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Collaborator created successfully" })),
    ))
}

/// Reads the form into a submission. Empty file parts are skipped.
async fn read_submission(multipart: &mut Multipart) -> ApiResult<CollaboratorSubmission> {
    let mut submission = CollaboratorSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(|n| n.trim_end_matches("[]").to_string()) else {
            continue;
        };

        match name.as_str() {
            "image" | "experienceProvidedMedia" | "machineryAndEquipmentMedia" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(ToString::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.is_empty() {
                    continue;
                }

                let mut file = UploadedFile::new(content_type, data);
                if let Some(file_name) = file_name {
                    file = file.with_file_name(file_name);
                }
                match name.as_str() {
                    "image" => submission.image = Some(file),
                    "experienceProvidedMedia" => submission.experience_media.push(file),
                    _ => submission.machinery_media.push(file),
                }
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.set_field(&name, value);
            }
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::invalid_file("Request body exceeds the upload limit");
    }
    ApiError::validation(format!("Invalid form data: {}", err.body_text()))
}
