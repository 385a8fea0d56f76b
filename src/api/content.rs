//! Content authoring and review API endpoints
//!
//! Journalist surface:
//! - POST /api/v1/content - Create an article or newsletter
//! - GET  /api/v1/content/mine - Own items, with optional kind/search filters
//! - GET  /api/v1/content/{id} - One item (author or affiliated editor)
//! - PUT  /api/v1/content/{id} - Edit title/body (author, not after approval)
//! - DELETE /api/v1/content/{id} - Remove an item
//! - POST /api/v1/content/{id}/submit - Draft -> PendingApproval
//! - POST /api/v1/content/{id}/resubmit - Rejected -> PendingApproval
//!
//! Editor surface:
//! - GET  /api/v1/review/queue - Items of the editor's publishers
//! - POST /api/v1/content/{id}/approve - PendingApproval -> Approved
//! - POST /api/v1/content/{id}/reject - PendingApproval -> Rejected

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ContentResponse;
use crate::models::{ContentKind, CreateContentInput, UpdateContentInput};

/// Request body for creating a content item
#[derive(Debug, Deserialize)]
pub struct CreateContentRequest {
    /// "article" or "newsletter"
    pub kind: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub publisher_id: Option<i64>,
    /// Submit for approval immediately instead of keeping a draft
    #[serde(default)]
    pub submit: bool,
}

/// Request body for updating a content item
#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Query parameters for listing own content
#[derive(Debug, Deserialize)]
pub struct ListOwnQuery {
    /// Optional kind filter ("article" or "newsletter")
    pub kind: Option<String>,
    /// Optional search term
    pub q: Option<String>,
}

/// Query parameters for the review queue
#[derive(Debug, Deserialize)]
pub struct ReviewQueueQuery {
    /// Restrict to items waiting for a decision (default true)
    #[serde(default = "default_pending")]
    pub pending: bool,
}

fn default_pending() -> bool {
    true
}

fn parse_kind(value: &str) -> Result<ContentKind, ApiError> {
    ContentKind::from_str(value)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown content kind: {}", value)))
}

/// POST /api/v1/content
pub async fn create_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<CreateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&request.kind)?;

    let item = state
        .content_service
        .create(
            &user,
            CreateContentInput {
                kind,
                title: request.title,
                body: request.body,
                author_id: user.id,
                publisher_id: request.publisher_id,
            },
            request.submit,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ContentResponse::from(item))))
}

/// GET /api/v1/content/mine
pub async fn list_own_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<ListOwnQuery>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(value) => Some(parse_kind(value)?),
        None => None,
    };

    let items = state
        .content_service
        .list_own(&user, kind, query.q.as_deref())
        .await?;

    Ok(Json(items.into_iter().map(ContentResponse::from).collect()))
}

/// GET /api/v1/content/{id}
pub async fn get_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.get_for_staff(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}

/// PUT /api/v1/content/{id}
pub async fn update_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state
        .content_service
        .update(
            &user,
            id,
            UpdateContentInput {
                title: request.title,
                body: request.body,
            },
        )
        .await?;

    Ok(Json(ContentResponse::from(item)))
}

/// DELETE /api/v1/content/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/content/{id}/submit
pub async fn submit_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.submit(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}

/// POST /api/v1/content/{id}/resubmit
pub async fn resubmit_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.resubmit(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}

/// POST /api/v1/content/{id}/approve
pub async fn approve_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.approve(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}

/// POST /api/v1/content/{id}/reject
pub async fn reject_content(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.reject(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}

/// GET /api/v1/review/queue
pub async fn review_queue(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    let items = state
        .content_service
        .review_queue(&user, query.pending)
        .await?;

    Ok(Json(items.into_iter().map(ContentResponse::from).collect()))
}
