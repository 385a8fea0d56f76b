//! Subscription repository
//!
//! Database operations for reader subscriptions.
//!
//! This module provides:
//! - `SubscriptionRepository` trait defining the interface for subscription data access
//! - `SqlxSubscriptionRepository` implementing the trait for SQLite

use crate::db::DbPool;
use crate::models::{Subscription, SubscriptionTarget};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Record a subscription. A duplicate (reader, target) pair is a no-op.
    async fn add(&self, reader_id: i64, target: SubscriptionTarget, target_id: i64) -> Result<()>;

    /// Remove a subscription
    async fn remove(&self, reader_id: i64, target: SubscriptionTarget, target_id: i64) -> Result<()>;

    /// Remove all of a reader's subscriptions
    async fn remove_all_for_reader(&self, reader_id: i64) -> Result<()>;

    /// List a reader's subscriptions
    async fn list_for_reader(&self, reader_id: i64) -> Result<Vec<Subscription>>;

    /// Email addresses of readers subscribed to the given publisher
    async fn publisher_subscriber_emails(&self, publisher_id: i64) -> Result<Vec<String>>;
}

/// SQLx-based subscription repository implementation
pub struct SqlxSubscriptionRepository {
    pool: DbPool,
}

impl SqlxSubscriptionRepository {
    /// Create a new SQLx subscription repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn SubscriptionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubscriptionRepository for SqlxSubscriptionRepository {
    async fn add(&self, reader_id: i64, target: SubscriptionTarget, target_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO subscriptions (reader_id, target_kind, target_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(reader_id)
        .bind(target.as_str())
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to add subscription")?;

        Ok(())
    }

    async fn remove(&self, reader_id: i64, target: SubscriptionTarget, target_id: i64) -> Result<()> {
        sqlx::query(
            "DELETE FROM subscriptions WHERE reader_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(reader_id)
        .bind(target.as_str())
        .bind(target_id)
        .execute(&self.pool)
        .await
        .context("Failed to remove subscription")?;

        Ok(())
    }

    async fn remove_all_for_reader(&self, reader_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM subscriptions WHERE reader_id = ?")
            .bind(reader_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear subscriptions")?;

        Ok(())
    }

    async fn list_for_reader(&self, reader_id: i64) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, target_kind, target_id, created_at
            FROM subscriptions
            WHERE reader_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subscriptions")?;

        rows.iter().map(row_to_subscription).collect()
    }

    async fn publisher_subscriber_emails(&self, publisher_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT u.email
            FROM users u
            INNER JOIN subscriptions s ON s.reader_id = u.id
            WHERE s.target_kind = 'publisher' AND s.target_id = ?
            ORDER BY u.email
            "#,
        )
        .bind(publisher_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subscriber emails")?;

        Ok(rows.iter().map(|row| row.get("email")).collect())
    }
}

fn row_to_subscription(row: &sqlx::sqlite::SqliteRow) -> Result<Subscription> {
    let kind_str: String = row.get("target_kind");
    let target_kind = SubscriptionTarget::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid subscription target: {}", kind_str))?;

    Ok(Subscription {
        id: row.get("id"),
        reader_id: row.get("reader_id"),
        target_kind,
        target_id: row.get("target_id"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
