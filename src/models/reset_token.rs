//! Password reset token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single-use password reset token bound to a user.
///
/// Only the SHA-256 digest of the token is stored; the raw token exists solely
/// inside the reset link emailed to the user. Tokens expire five minutes after
/// issuance and are marked used once consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    /// Unique identifier
    pub id: i64,
    /// User the token belongs to
    pub user_id: i64,
    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Whether the token has already been consumed
    pub used: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
