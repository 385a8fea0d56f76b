//! Subscription API endpoints
//!
//! Handles HTTP requests for reader subscriptions:
//! - GET    /api/v1/my-subscriptions - The reader's subscriptions by name
//! - POST   /api/v1/subscriptions - Subscribe to a publisher or journalist
//! - DELETE /api/v1/subscriptions/{kind}/{id} - Unsubscribe

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{SubscriptionSummary, SubscriptionTarget};

/// Request body for creating a subscription
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// "publisher" or "journalist"
    pub target_kind: String,
    pub target_id: i64,
}

fn parse_target(value: &str) -> Result<SubscriptionTarget, ApiError> {
    SubscriptionTarget::from_str(value).ok_or_else(|| {
        ApiError::validation_error(format!("Unknown subscription target: {}", value))
    })
}

/// GET /api/v1/my-subscriptions
pub async fn my_subscriptions(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<SubscriptionSummary>, ApiError> {
    let summary = state.subscription_service.my_subscriptions(&user).await?;
    Ok(Json(summary))
}

/// POST /api/v1/subscriptions
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = parse_target(&request.target_kind)?;

    state
        .subscription_service
        .subscribe(&user, target, request.target_id)
        .await?;

    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/subscriptions/{kind}/{id}
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let target = parse_target(&kind)?;

    state
        .subscription_service
        .unsubscribe(&user, target, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
