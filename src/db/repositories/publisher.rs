//! Publisher repository
//!
//! Database operations for publishers and their journalist/editor
//! affiliations.
//!
//! This module provides:
//! - `PublisherRepository` trait defining the interface for publisher data access
//! - `SqlxPublisherRepository` implementing the trait for SQLite

use crate::db::DbPool;
use crate::models::{CreatePublisherInput, Publisher, UpdatePublisherInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Publisher repository trait
#[async_trait]
pub trait PublisherRepository: Send + Sync {
    /// Create a new publisher
    async fn create(&self, input: &CreatePublisherInput) -> Result<Publisher>;

    /// Get publisher by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Publisher>>;

    /// Get publisher by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Publisher>>;

    /// List all publishers, optionally filtered by a search term over
    /// name and description
    async fn list(&self, search: Option<&str>) -> Result<Vec<Publisher>>;

    /// Update a publisher
    async fn update(&self, id: i64, input: &UpdatePublisherInput) -> Result<Publisher>;

    /// Delete a publisher
    async fn delete(&self, id: i64) -> Result<()>;

    /// Add a journalist affiliation
    async fn add_journalist(&self, publisher_id: i64, user_id: i64) -> Result<()>;

    /// Remove a journalist affiliation
    async fn remove_journalist(&self, publisher_id: i64, user_id: i64) -> Result<()>;

    /// Add an editor affiliation
    async fn add_editor(&self, publisher_id: i64, user_id: i64) -> Result<()>;

    /// Remove an editor affiliation
    async fn remove_editor(&self, publisher_id: i64, user_id: i64) -> Result<()>;

    /// Check whether the user is an affiliated journalist of the publisher
    async fn is_journalist(&self, publisher_id: i64, user_id: i64) -> Result<bool>;

    /// Check whether the user is an affiliated editor of the publisher
    async fn is_editor(&self, publisher_id: i64, user_id: i64) -> Result<bool>;

    /// Usernames of the publisher's affiliated journalists
    async fn journalist_names(&self, publisher_id: i64) -> Result<Vec<String>>;

    /// Usernames of the publisher's affiliated editors
    async fn editor_names(&self, publisher_id: i64) -> Result<Vec<String>>;
}

/// SQLx-based publisher repository implementation
pub struct SqlxPublisherRepository {
    pool: DbPool,
}

impl SqlxPublisherRepository {
    /// Create a new SQLx publisher repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PublisherRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PublisherRepository for SqlxPublisherRepository {
    async fn create(&self, input: &CreatePublisherInput) -> Result<Publisher> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO publishers (name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create publisher")?;

        Ok(Publisher {
            id: result.last_insert_rowid(),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Publisher>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM publishers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get publisher by ID")?;

        row.map(|row| row_to_publisher(&row)).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Publisher>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM publishers WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get publisher by name")?;

        row.map(|row| row_to_publisher(&row)).transpose()
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Publisher>> {
        let rows = match search {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM publishers
                    WHERE name LIKE ? OR description LIKE ?
                    ORDER BY name
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, description, created_at, updated_at
                    FROM publishers
                    ORDER BY name
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list publishers")?;

        rows.iter().map(row_to_publisher).collect()
    }

    async fn update(&self, id: i64, input: &UpdatePublisherInput) -> Result<Publisher> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publisher not found"))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().unwrap_or(&existing.description);
        let now = Utc::now();

        sqlx::query("UPDATE publishers SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update publisher")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publisher not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // Affiliation rows go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM publishers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete publisher")?;

        Ok(())
    }

    async fn add_journalist(&self, publisher_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO publisher_journalists (publisher_id, user_id) VALUES (?, ?)",
        )
        .bind(publisher_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to add journalist affiliation")?;

        Ok(())
    }

    async fn remove_journalist(&self, publisher_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM publisher_journalists WHERE publisher_id = ? AND user_id = ?")
            .bind(publisher_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove journalist affiliation")?;

        Ok(())
    }

    async fn add_editor(&self, publisher_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO publisher_editors (publisher_id, user_id) VALUES (?, ?)",
        )
        .bind(publisher_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to add editor affiliation")?;

        Ok(())
    }

    async fn remove_editor(&self, publisher_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM publisher_editors WHERE publisher_id = ? AND user_id = ?")
            .bind(publisher_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove editor affiliation")?;

        Ok(())
    }

    async fn is_journalist(&self, publisher_id: i64, user_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM publisher_journalists WHERE publisher_id = ? AND user_id = ?",
        )
        .bind(publisher_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check journalist affiliation")?;

        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn is_editor(&self, publisher_id: i64, user_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM publisher_editors WHERE publisher_id = ? AND user_id = ?",
        )
        .bind(publisher_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check editor affiliation")?;

        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn journalist_names(&self, publisher_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT u.username
            FROM users u
            INNER JOIN publisher_journalists pj ON pj.user_id = u.id
            WHERE pj.publisher_id = ?
            ORDER BY u.username
            "#,
        )
        .bind(publisher_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list affiliated journalists")?;

        Ok(rows.iter().map(|row| row.get("username")).collect())
    }

    async fn editor_names(&self, publisher_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT u.username
            FROM users u
            INNER JOIN publisher_editors pe ON pe.user_id = u.id
            WHERE pe.publisher_id = ?
            ORDER BY u.username
            "#,
        )
        .bind(publisher_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list affiliated editors")?;

        Ok(rows.iter().map(|row| row.get("username")).collect())
    }
}

fn row_to_publisher(row: &sqlx::sqlite::SqliteRow) -> Result<Publisher> {
    Ok(Publisher {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}
