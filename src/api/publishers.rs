//! Publisher administration API endpoints
//!
//! Manager surface for publishers and affiliations:
//! - POST   /api/v1/publishers - Create a publisher
//! - GET    /api/v1/publishers - List publishers (optional search)
//! - GET    /api/v1/publishers/{id} - Publisher with affiliated staff
//! - PUT    /api/v1/publishers/{id} - Update name/description
//! - DELETE /api/v1/publishers/{id} - Delete a publisher
//! - POST/DELETE /api/v1/publishers/{id}/journalists/{user_id}
//! - POST/DELETE /api/v1/publishers/{id}/editors/{user_id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreatePublisherInput, Publisher, PublisherWithStaff, UpdatePublisherInput};

/// Request body for creating a publisher
#[derive(Debug, Deserialize)]
pub struct CreatePublisherRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for updating a publisher
#[derive(Debug, Deserialize)]
pub struct UpdatePublisherRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for listing publishers
#[derive(Debug, Deserialize)]
pub struct ListPublishersQuery {
    /// Optional search term over name and description
    pub q: Option<String>,
}

/// POST /api/v1/publishers
pub async fn create_publisher(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<CreatePublisherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let publisher = state
        .publisher_service
        .create(
            &user,
            CreatePublisherInput {
                name: request.name,
                description: request.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(publisher)))
}

/// GET /api/v1/publishers
pub async fn list_publishers(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<ListPublishersQuery>,
) -> Result<Json<Vec<Publisher>>, ApiError> {
    let publishers = state
        .publisher_service
        .list(&user, query.q.as_deref())
        .await?;

    Ok(Json(publishers))
}

/// GET /api/v1/publishers/{id}
pub async fn get_publisher(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<PublisherWithStaff>, ApiError> {
    let publisher = state.publisher_service.get_with_staff(&user, id).await?;
    Ok(Json(publisher))
}

/// PUT /api/v1/publishers/{id}
pub async fn update_publisher(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePublisherRequest>,
) -> Result<Json<Publisher>, ApiError> {
    let publisher = state
        .publisher_service
        .update(
            &user,
            id,
            UpdatePublisherInput {
                name: request.name,
                description: request.description,
            },
        )
        .await?;

    Ok(Json(publisher))
}

/// DELETE /api/v1/publishers/{id}
pub async fn delete_publisher(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.publisher_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/publishers/{id}/journalists/{user_id}
pub async fn add_journalist(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .publisher_service
        .add_journalist(&user, id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/publishers/{id}/journalists/{user_id}
pub async fn remove_journalist(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .publisher_service
        .remove_journalist(&user, id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/publishers/{id}/editors/{user_id}
pub async fn add_editor(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.publisher_service.add_editor(&user, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/publishers/{id}/editors/{user_id}
pub async fn remove_editor(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .publisher_service
        .remove_editor(&user, id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
