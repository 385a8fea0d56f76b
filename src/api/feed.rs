//! Reader feed API endpoints
//!
//! Handles HTTP requests for the reader-facing surface:
//! - GET /api/v1/articles - Approved articles visible to the reader
//! - GET /api/v1/newsletters - Approved newsletters visible to the reader
//! - GET /api/v1/feed/{id} - A single visible item
//!
//! All three run through the content service's visibility query; there is no
//! separate filtering logic at this layer.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ContentResponse;
use crate::models::{ContentKind, ListParams};

/// Query parameters for feed listings
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// GET /api/v1/articles
pub async fn list_articles(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    list_feed(state, user, ContentKind::Article, query).await
}

/// GET /api/v1/newsletters
pub async fn list_newsletters(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    list_feed(state, user, ContentKind::Newsletter, query).await
}

async fn list_feed(
    state: AppState,
    user: crate::models::User,
    kind: ContentKind,
    query: FeedQuery,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let items = state
        .content_service
        .visible_feed(&user, Some(kind), &params)
        .await?;

    Ok(Json(items.into_iter().map(ContentResponse::from).collect()))
}

/// GET /api/v1/feed/{id}
pub async fn get_feed_item(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContentResponse>, ApiError> {
    let item = state.content_service.visible_item(&user, id).await?;
    Ok(Json(ContentResponse::from(item)))
}
