//! Publisher model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news publishing organization.
///
/// Publishers own content submitted by affiliated journalists and approved by
/// affiliated editors. Affiliations are stored separately as join rows; this
/// struct carries only the publisher record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    /// Unique identifier
    pub id: i64,
    /// Publisher name (unique)
    pub name: String,
    /// Description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new publisher
#[derive(Debug, Clone)]
pub struct CreatePublisherInput {
    /// Publisher name (must be unique)
    pub name: String,
    /// Description
    pub description: String,
}

/// Input for updating a publisher
#[derive(Debug, Clone, Default)]
pub struct UpdatePublisherInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
}

/// A publisher together with its affiliated journalists and editors
#[derive(Debug, Clone, Serialize)]
pub struct PublisherWithStaff {
    /// The publisher record
    #[serde(flatten)]
    pub publisher: Publisher,
    /// Usernames of affiliated journalists
    pub journalists: Vec<String>,
    /// Usernames of affiliated editors
    pub editors: Vec<String>,
}
