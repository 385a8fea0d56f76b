//! Content repository
//!
//! Database operations for articles and newsletters.
//!
//! This module provides:
//! - `ContentRepository` trait defining the interface for content data access
//! - `SqlxContentRepository` implementing the trait for SQLite
//!
//! Two pieces here carry the workflow's correctness weight:
//! - `transition_status` is a compare-and-swap on the status column, so a
//!   transition succeeds for exactly one caller even under concurrent requests
//! - `VISIBLE_PREDICATE` is the single SQL predicate behind every
//!   reader-facing query, so the feed and the read API cannot drift apart

use crate::db::DbPool;
use crate::models::{ContentItem, ContentKind, ContentStatus, CreateContentInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Columns selected for every content query
const CONTENT_COLUMNS: &str = "id, kind, title, body, body_html, author_id, publisher_id, status, approved_by, approved_at, created_at, updated_at";

/// The visibility predicate shared by all reader-facing queries.
///
/// An item is visible to a reader iff it is approved and either independent
/// (no owning publisher), or owned by a publisher the reader subscribes to,
/// or written by a journalist the reader subscribes to. Binds the reader ID
/// twice.
const VISIBLE_PREDICATE: &str = r#"
    status = 'approved'
    AND (
        publisher_id IS NULL
        OR EXISTS (
            SELECT 1 FROM subscriptions s
            WHERE s.reader_id = ? AND s.target_kind = 'publisher' AND s.target_id = content_items.publisher_id
        )
        OR EXISTS (
            SELECT 1 FROM subscriptions s
            WHERE s.reader_id = ? AND s.target_kind = 'journalist' AND s.target_id = content_items.author_id
        )
    )
"#;

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Create a new content item with the given initial status.
    ///
    /// When the initial status is Approved (independent items), the creation
    /// instant doubles as the approval timestamp.
    async fn create(
        &self,
        input: &CreateContentInput,
        body_html: &str,
        status: ContentStatus,
    ) -> Result<ContentItem>;

    /// Get content item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ContentItem>>;

    /// List a journalist's own items, newest first, optionally filtered by
    /// kind and a search term over title and body
    async fn list_by_author(
        &self,
        author_id: i64,
        kind: Option<ContentKind>,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>>;

    /// List items belonging to publishers the editor is affiliated with,
    /// newest first, optionally restricted to pending items
    async fn list_for_editor(&self, editor_id: i64, pending_only: bool) -> Result<Vec<ContentItem>>;

    /// Replace the title/body of an item
    async fn update_body(&self, id: i64, title: &str, body: &str, body_html: &str) -> Result<()>;

    /// Delete a content item
    async fn delete(&self, id: i64) -> Result<()>;

    /// Atomically move an item from `from` to `to`.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// item was not in `from` (wrong state, or a concurrent caller got there
    /// first). When `to` is Approved, records the approving editor and the
    /// approval timestamp.
    async fn transition_status(
        &self,
        id: i64,
        from: ContentStatus,
        to: ContentStatus,
        approved_by: Option<i64>,
    ) -> Result<bool>;

    /// List the items visible to a reader, newest first
    async fn list_visible_to(
        &self,
        reader_id: i64,
        kind: Option<ContentKind>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ContentItem>>;

    /// Fetch a single item if it is visible to the reader
    async fn get_visible_to(&self, reader_id: i64, id: i64) -> Result<Option<ContentItem>>;
}

/// SQLx-based content repository implementation
pub struct SqlxContentRepository {
    pool: DbPool,
}

impl SqlxContentRepository {
    /// Create a new SQLx content repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn create(
        &self,
        input: &CreateContentInput,
        body_html: &str,
        status: ContentStatus,
    ) -> Result<ContentItem> {
        let now = Utc::now();
        let approved_at = if status == ContentStatus::Approved {
            Some(now)
        } else {
            None
        };

        let result = sqlx::query(
            r#"
            INSERT INTO content_items (kind, title, body, body_html, author_id, publisher_id, status, approved_by, approved_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.kind.as_str())
        .bind(&input.title)
        .bind(&input.body)
        .bind(body_html)
        .bind(input.author_id)
        .bind(input.publisher_id)
        .bind(status.as_str())
        .bind::<Option<i64>>(None)
        .bind(approved_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create content item")?;

        Ok(ContentItem {
            id: result.last_insert_rowid(),
            kind: input.kind,
            title: input.title.clone(),
            body: input.body.clone(),
            body_html: body_html.to_string(),
            author_id: input.author_id,
            publisher_id: input.publisher_id,
            status,
            approved_by: None,
            approved_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM content_items WHERE id = ?",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get content item by ID")?;

        row.map(|row| row_to_content(&row)).transpose()
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        kind: Option<ContentKind>,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>> {
        let mut sql = format!(
            "SELECT {} FROM content_items WHERE author_id = ?",
            CONTENT_COLUMNS
        );
        if kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        if search.is_some() {
            sql.push_str(" AND (title LIKE ? OR body LIKE ?)");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql).bind(author_id);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }
        if let Some(term) = search {
            let pattern = format!("%{}%", term);
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list content by author")?;

        rows.iter().map(row_to_content).collect()
    }

    async fn list_for_editor(&self, editor_id: i64, pending_only: bool) -> Result<Vec<ContentItem>> {
        let mut sql = format!(
            r#"
            SELECT {}
            FROM content_items
            WHERE publisher_id IN (
                SELECT publisher_id FROM publisher_editors WHERE user_id = ?
            )
            "#,
            CONTENT_COLUMNS
        );
        if pending_only {
            sql.push_str(" AND status = 'pending_approval'");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let rows = sqlx::query(&sql)
            .bind(editor_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list content for editor")?;

        rows.iter().map(row_to_content).collect()
    }

    async fn update_body(&self, id: i64, title: &str, body: &str, body_html: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_items
            SET title = ?, body = ?, body_html = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(body)
        .bind(body_html)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update content item")?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM content_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete content item")?;

        Ok(())
    }

    async fn transition_status(
        &self,
        id: i64,
        from: ContentStatus,
        to: ContentStatus,
        approved_by: Option<i64>,
    ) -> Result<bool> {
        let now = Utc::now();

        // The WHERE clause on the current status makes this a compare-and-swap:
        // of two racing callers, only one sees a row to update.
        let result = if to == ContentStatus::Approved {
            sqlx::query(
                r#"
                UPDATE content_items
                SET status = ?, approved_by = ?, approved_at = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(to.as_str())
            .bind(approved_by)
            .bind(now)
            .bind(now)
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE content_items
                SET status = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(to.as_str())
            .bind(now)
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await
        }
        .context("Failed to transition content status")?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_visible_to(
        &self,
        reader_id: i64,
        kind: Option<ContentKind>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ContentItem>> {
        let mut sql = format!(
            "SELECT {} FROM content_items WHERE {}",
            CONTENT_COLUMNS, VISIBLE_PREDICATE
        );
        if kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql).bind(reader_id).bind(reader_id);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list visible content")?;

        rows.iter().map(row_to_content).collect()
    }

    async fn get_visible_to(&self, reader_id: i64, id: i64) -> Result<Option<ContentItem>> {
        let sql = format!(
            "SELECT {} FROM content_items WHERE id = ? AND {}",
            CONTENT_COLUMNS, VISIBLE_PREDICATE
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(reader_id)
            .bind(reader_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get visible content item")?;

        row.map(|row| row_to_content(&row)).transpose()
    }
}

fn row_to_content(row: &sqlx::sqlite::SqliteRow) -> Result<ContentItem> {
    let kind_str: String = row.get("kind");
    let kind = ContentKind::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid content kind: {}", kind_str))?;

    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid content status: {}", status_str))?;

    Ok(ContentItem {
        id: row.get("id"),
        kind,
        title: row.get("title"),
        body: row.get("body"),
        body_html: row.get("body_html"),
        author_id: row.get("author_id"),
        publisher_id: row.get("publisher_id"),
        status,
        approved_by: row.get("approved_by"),
        approved_at: row.get::<Option<DateTime<Utc>>, _>("approved_at"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}
