//! Shared API response types
//!
//! Common response structures used across multiple endpoints to keep the
//! wire format consistent.

use serde::{Deserialize, Serialize};

use crate::models::{ContentItem, User};

/// Content item response
#[derive(Debug, Serialize, Deserialize)]
pub struct ContentResponse {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub body_html: String,
    pub author_id: i64,
    pub publisher_id: Option<i64>,
    pub status: String,
    pub approved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContentItem> for ContentResponse {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind.to_string(),
            title: item.title,
            body: item.body,
            body_html: item.body_html,
            author_id: item.author_id,
            publisher_id: item.publisher_id,
            status: item.status.to_string(),
            approved_at: item.approved_at.map(|dt| dt.to_rfc3339()),
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// User response (never carries the password hash)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            phone_number: user.phone_number,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}
