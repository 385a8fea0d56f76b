//! Password reset token repository
//!
//! Database operations for single-use password reset tokens.
//!
//! This module provides:
//! - `ResetTokenRepository` trait defining the interface for token data access
//! - `SqlxResetTokenRepository` implementing the trait for SQLite

use crate::db::DbPool;
use crate::models::ResetToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Reset token repository trait
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Store a token digest for a user with the given expiry
    async fn create(&self, user_id: i64, token_hash: &str, expires_at: DateTime<Utc>)
        -> Result<ResetToken>;

    /// Look up a token by its digest
    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<ResetToken>>;

    /// Mark a token as used.
    ///
    /// Returns `true` if the token was unused before this call; the WHERE
    /// clause on `used` keeps a token single-use even under concurrent
    /// consumption.
    async fn mark_used(&self, id: i64) -> Result<bool>;

    /// Delete expired tokens, returning how many were removed
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based reset token repository implementation
pub struct SqlxResetTokenRepository {
    pool: DbPool,
}

impl SqlxResetTokenRepository {
    /// Create a new SQLx reset token repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn ResetTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResetTokenRepository for SqlxResetTokenRepository {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO reset_tokens (user_id, token_hash, expires_at, used, created_at)
            VALUES (?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create reset token")?;

        Ok(ResetToken {
            id: result.last_insert_rowid(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used: false,
            created_at: now,
        })
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<ResetToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, used, created_at
            FROM reset_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get reset token")?;

        Ok(row.map(|row| ResetToken {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
            used: row.get("used"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        }))
    }

    async fn mark_used(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE reset_tokens SET used = TRUE WHERE id = ? AND used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark reset token used")?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self) -> Result<i64> {
        let result = sqlx::query("DELETE FROM reset_tokens WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired reset tokens")?;

        Ok(result.rows_affected() as i64)
    }
}
