//! Auth API endpoints
//!
//! Handles HTTP requests for accounts and sessions:
//! - POST /api/v1/auth/register - Create an account with an explicit role
//! - POST /api/v1/auth/login - Exchange credentials for a session token
//! - POST /api/v1/auth/logout - Revoke the current session
//! - GET  /api/v1/auth/me - Current user
//! - POST /api/v1/auth/forgot-password - Email a reset link
//! - POST /api/v1/auth/reset-password - Consume a reset token

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{CreateUserInput, Role};
use crate::services::{LoginInput, UserServiceError};

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response body for login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Request body for requesting a password reset
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for resetting the password
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = match request.role.as_deref() {
        Some(value) => Some(
            Role::from_str(value).map_err(|_| {
                ApiError::validation_error(format!("Unknown role: {}", value))
            })?,
        ),
        None => None,
    };

    let user = state
        .user_service
        .register(CreateUserInput {
            username: request.username,
            email: request.email,
            password: request.password,
            role,
            phone_number: request.phone_number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.rate_limiter.is_limited(&request.username_or_email).await {
        return Err(ApiError::rate_limited(
            "Too many failed login attempts, try again later",
        ));
    }

    let login_result = state
        .user_service
        .login(LoginInput {
            username_or_email: request.username_or_email.clone(),
            password: request.password,
        })
        .await;

    let (session, user) = match login_result {
        Ok(ok) => ok,
        Err(e) => {
            if matches!(e, UserServiceError::AuthenticationError(_)) {
                state.rate_limiter.record_failure(&request.username_or_email).await;
            }
            return Err(e.into());
        }
    };

    state.rate_limiter.clear(&request.username_or_email).await;

    let mut headers = HeaderMap::new();
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800",
        session.id
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }

    Ok((
        headers,
        Json(LoginResponse {
            token: session.id,
            user: UserResponse::from(user),
        }),
    ))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<impl IntoResponse, ApiError> {
    let token = crate::api::middleware::extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(&token).await?;

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str("session=; Path=/; HttpOnly; Max-Age=0") {
        headers.insert(header::SET_COOKIE, value);
    }

    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /api/v1/auth/me
pub async fn me(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// POST /api/v1/auth/forgot-password
///
/// Always answers with the same message; whether the address exists is not
/// revealed to the caller.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some((user, raw_token)) = state
        .user_service
        .request_password_reset(&request.email)
        .await?
    {
        let reset_url = format!(
            "{}/reset-password/{}",
            state.site.public_url.trim_end_matches('/'),
            raw_token
        );
        let body = format!(
            "Hi {}, here is the link to reset your password: {}\n\nThe link expires in 5 minutes.",
            user.username, reset_url
        );

        if let Err(e) = state
            .email
            .send_plain(&user.email, "Password Reset", &body)
            .await
        {
            tracing::warn!("Failed to send password reset email: {}", e);
        }
    }

    Ok(Json(serde_json::json!({
        "message": "If the address exists, a reset email has been sent"
    })))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.password.len() < 8 {
        return Err(ApiError::validation_error(
            "Password must be at least 8 characters",
        ));
    }

    state
        .user_service
        .reset_password(&request.token, &request.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
