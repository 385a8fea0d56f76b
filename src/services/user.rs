//! User service
//!
//! Implements business logic for user management:
//! - Registration with explicit role assignment
//! - Login/logout and session validation
//! - Password reset tokens (single-use, 5-minute expiry)
//! - Account updates, including the subscription purge when a user stops
//!   being a reader

use crate::db::repositories::{
    ResetTokenRepository, SessionRepository, SubscriptionRepository, UserRepository,
};
use crate::models::{CreateUserInput, ResetToken, Role, Session, UpdateUserInput, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Session expiration time in days
const SESSION_EXPIRATION_DAYS: i64 = 7;

/// Reset token lifetime in minutes
const RESET_TOKEN_TTL_MINUTES: i64 = 5;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Referenced user does not exist
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Error types for reset token validation
#[derive(Debug, thiserror::Error)]
pub enum ResetTokenError {
    /// The token exists but its five minutes are up
    #[error("Reset token has expired")]
    Expired,

    /// Unknown, malformed, or already-used token
    #[error("Reset token is invalid")]
    Invalid,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Input for logging in
#[derive(Debug, Clone)]
pub struct LoginInput {
    /// Username or email address
    pub username_or_email: String,
    /// Plaintext password
    pub password: String,
}

/// User service for accounts, sessions, and password resets
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    reset_token_repo: Arc<dyn ResetTokenRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        reset_token_repo: Arc<dyn ResetTokenRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            reset_token_repo,
            subscription_repo,
        }
    }

    /// Register a new user.
    ///
    /// The requested role is written to the account as part of registration;
    /// it defaults to Reader when absent.
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let role = input.role.unwrap_or_default();
        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let mut user = User::new(input.username, input.email, password_hash, role);
        user.phone_number = input.phone_number;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Login with credentials, returning a fresh session and the user
    pub async fn login(&self, input: LoginInput) -> Result<(Session, User), UserServiceError> {
        let user = self
            .find_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(SESSION_EXPIRATION_DAYS),
            created_at: now,
        };

        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok((session, user))
    }

    /// Delete the session identified by the token
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are removed on sight and resolve to `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to look up session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(&session.id)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to look up session user")?;

        Ok(user)
    }

    /// Look up a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?)
    }

    /// Update a user account.
    ///
    /// A role change away from Reader removes every subscription the account
    /// holds; only readers subscribe.
    pub async fn update_user(
        &self,
        user_id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(email) = input.email {
            if email.trim().is_empty() || !email.contains('@') {
                return Err(UserServiceError::ValidationError(
                    "Invalid email address".to_string(),
                ));
            }
            user.email = email;
        }
        if let Some(password) = input.password {
            if password.len() < 8 {
                return Err(UserServiceError::ValidationError(
                    "Password must be at least 8 characters".to_string(),
                ));
            }
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(phone_number) = input.phone_number {
            user.phone_number = Some(phone_number);
        }

        let role_changed_from_reader = match input.role {
            Some(role) => {
                let left_readership = user.role == Role::Reader && role != Role::Reader;
                user.role = role;
                left_readership
            }
            None => false,
        };

        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        if role_changed_from_reader {
            self.subscription_repo
                .remove_all_for_reader(user.id)
                .await
                .context("Failed to clear subscriptions")?;
        }

        Ok(user)
    }

    /// Issue a password reset token for the account behind `email`.
    ///
    /// Returns the user and the raw token to embed in the reset link, or
    /// `None` when no account matches (callers should not reveal which).
    /// Only the SHA-256 digest is stored; the token expires in five minutes.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, UserServiceError> {
        let user = match self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
        {
            Some(user) => user,
            None => return Ok(None),
        };

        let raw_token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        self.reset_token_repo
            .create(user.id, &token_digest(&raw_token), expires_at)
            .await
            .context("Failed to store reset token")?;

        Ok(Some((user, raw_token)))
    }

    /// Validate a raw reset token: the bound user on success, `Expired` when
    /// past its deadline, `Invalid` for unknown or already-used tokens.
    pub async fn validate_reset_token(&self, raw_token: &str) -> Result<User, ResetTokenError> {
        let token = self.lookup_reset_token(raw_token).await?;

        self.user_repo
            .get_by_id(token.user_id)
            .await
            .context("Failed to look up token user")?
            .ok_or(ResetTokenError::Invalid)
    }

    /// Consume a reset token and set a new password.
    ///
    /// The token is marked used atomically, so a token can reset a password
    /// at most once; all existing sessions of the user are revoked.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<User, ResetTokenError> {
        let token = self.lookup_reset_token(raw_token).await?;

        let consumed = self
            .reset_token_repo
            .mark_used(token.id)
            .await
            .context("Failed to mark token used")?;
        if !consumed {
            return Err(ResetTokenError::Invalid);
        }

        let mut user = self
            .user_repo
            .get_by_id(token.user_id)
            .await
            .context("Failed to look up token user")?
            .ok_or(ResetTokenError::Invalid)?;

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&user)
            .await
            .context("Failed to update password")?;

        self.session_repo
            .delete_by_user(user.id)
            .await
            .context("Failed to revoke sessions")?;

        Ok(user)
    }

    async fn lookup_reset_token(&self, raw_token: &str) -> Result<ResetToken, ResetTokenError> {
        let token = self
            .reset_token_repo
            .get_by_hash(&token_digest(raw_token))
            .await
            .context("Failed to look up reset token")?
            .ok_or(ResetTokenError::Invalid)?;

        if token.used {
            return Err(ResetTokenError::Invalid);
        }
        if token.is_expired() {
            return Err(ResetTokenError::Expired);
        }

        Ok(token)
    }

    async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if username_or_email.contains('@') {
            Ok(self
                .user_repo
                .get_by_email(username_or_email)
                .await
                .context("Failed to look up user by email")?)
        } else {
            Ok(self
                .user_repo
                .get_by_username(username_or_email)
                .await
                .context("Failed to look up user by username")?)
        }
    }

    fn validate_register_input(&self, input: &CreateUserInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if input.username.len() > 50 {
            return Err(UserServiceError::ValidationError(
                "Username is too long".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        if input.password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// SHA-256 hex digest of a raw reset token
fn token_digest(raw_token: &str) -> String {
    format!("{:x}", Sha256::digest(raw_token.as_bytes()))
}
