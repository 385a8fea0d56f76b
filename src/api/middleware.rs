//! API middleware
//!
//! Contains:
//! - `AppState`, the shared service handle for every handler
//! - `ApiError`, the structured error body with HTTP status mapping
//! - Session extraction and the authentication middleware
//!
//! Role and affiliation checks live in the services, which return typed
//! errors; this layer only authenticates the caller and translates service
//! errors into responses.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::models::User;
use crate::notify::EmailSender;
use crate::services::{
    ContentService, ContentServiceError, LoginRateLimiter, PublisherService,
    PublisherServiceError, ResetTokenError, SubscriptionService, SubscriptionServiceError,
    UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub content_service: Arc<ContentService>,
    pub publisher_service: Arc<PublisherService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub email: Arc<EmailSender>,
    pub site: SiteConfig,
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new("PERMISSION_DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new("INVALID_TRANSITION", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "PERMISSION_DENIED" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "INVALID_TRANSITION" => StatusCode::CONFLICT,
            "CONFLICT" => StatusCode::CONFLICT,
            "TOKEN_EXPIRED" => StatusCode::GONE,
            "TOKEN_INVALID" => StatusCode::BAD_REQUEST,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(e: ContentServiceError) -> Self {
        match e {
            ContentServiceError::PermissionDenied(msg) => ApiError::permission_denied(msg),
            ContentServiceError::InvalidTransition(msg) => ApiError::invalid_transition(msg),
            ContentServiceError::NotFound(msg) => ApiError::not_found(msg),
            ContentServiceError::Validation(msg) => ApiError::validation_error(msg),
            ContentServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<SubscriptionServiceError> for ApiError {
    fn from(e: SubscriptionServiceError) -> Self {
        match e {
            SubscriptionServiceError::PermissionDenied(msg) => ApiError::permission_denied(msg),
            SubscriptionServiceError::NotFound(msg) => ApiError::not_found(msg),
            SubscriptionServiceError::Validation(msg) => ApiError::validation_error(msg),
            SubscriptionServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<PublisherServiceError> for ApiError {
    fn from(e: PublisherServiceError) -> Self {
        match e {
            PublisherServiceError::PermissionDenied(msg) => ApiError::permission_denied(msg),
            PublisherServiceError::NotFound(msg) => ApiError::not_found(msg),
            PublisherServiceError::DuplicateName(name) => {
                ApiError::conflict(format!("A publisher named '{}' already exists", name))
            }
            PublisherServiceError::Validation(msg) => ApiError::validation_error(msg),
            PublisherServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ResetTokenError> for ApiError {
    fn from(e: ResetTokenError) -> Self {
        match e {
            ResetTokenError::Expired => ApiError::new("TOKEN_EXPIRED", "Reset token has expired"),
            ResetTokenError::Invalid => ApiError::new("TOKEN_INVALID", "Reset token is invalid"),
            ResetTokenError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Extract the session token from the Authorization header or cookie
pub fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
