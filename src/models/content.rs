//! Content model
//!
//! This module provides:
//! - `ContentItem` entity covering both articles and newsletters
//! - `ContentKind` tag distinguishing the two
//! - `ContentStatus` enum for the approval lifecycle
//! - Input types for creating and updating content
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single piece of content: an article or a newsletter.
///
/// Items are either independent (no owning publisher, visible to every reader
/// as soon as they exist) or publisher-owned, in which case they move through
/// the editorial approval lifecycle before readers can see them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier
    pub id: i64,
    /// Article or newsletter
    pub kind: ContentKind,
    /// Title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Rendered HTML body
    pub body_html: String,
    /// Authoring journalist's user ID
    pub author_id: i64,
    /// Owning publisher; `None` means independent
    pub publisher_id: Option<i64>,
    /// Lifecycle status
    pub status: ContentStatus,
    /// Editor who approved the item, if any
    pub approved_by: Option<i64>,
    /// When the item entered the Approved state
    pub approved_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Check whether the item has no owning publisher
    pub fn is_independent(&self) -> bool {
        self.publisher_id.is_none()
    }
}

/// Content kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A news article
    Article,
    /// A newsletter
    Newsletter,
}

impl ContentKind {
    /// Convert kind to its database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Newsletter => "newsletter",
        }
    }

    /// Parse kind from its database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "article" => Some(ContentKind::Article),
            "newsletter" => Some(ContentKind::Newsletter),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content lifecycle status.
///
/// Publisher-owned items walk `Draft -> PendingApproval -> Approved/Rejected`,
/// with `Rejected -> PendingApproval` allowed for resubmission. Approved is
/// terminal. Independent items are created directly in Approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// Draft - only the author sees it
    Draft,
    /// Submitted, waiting for an editor's decision
    PendingApproval,
    /// Approved - visible to readers
    Approved,
    /// Rejected by an editor; the author may resubmit
    Rejected,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ContentStatus {
    /// Convert status to its database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::PendingApproval => "pending_approval",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
        }
    }

    /// Parse status from its database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ContentStatus::Draft),
            "pending_approval" => Some(ContentStatus::PendingApproval),
            "approved" => Some(ContentStatus::Approved),
            "rejected" => Some(ContentStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new content item
#[derive(Debug, Clone)]
pub struct CreateContentInput {
    /// Article or newsletter
    pub kind: ContentKind,
    /// Title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Authoring journalist's user ID
    pub author_id: i64,
    /// Owning publisher; `None` creates an independent item
    pub publisher_id: Option<i64>,
}

/// Input for updating an existing content item
#[derive(Debug, Clone, Default)]
pub struct UpdateContentInput {
    /// New title (optional)
    pub title: Option<String>,
    /// New markdown body (optional)
    pub body: Option<String>,
}

impl UpdateContentInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.body.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}
