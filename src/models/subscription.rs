//! Subscription model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reader's opt-in relation to a publisher or a journalist.
///
/// At most one subscription exists per (reader, target) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier
    pub id: i64,
    /// Subscribing reader's user ID
    pub reader_id: i64,
    /// What the reader follows
    pub target_kind: SubscriptionTarget,
    /// Publisher ID or journalist user ID, depending on `target_kind`
    pub target_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// The kind of entity a subscription points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTarget {
    /// Follow a publisher: all of its approved content becomes visible
    Publisher,
    /// Follow a journalist: their approved content becomes visible
    Journalist,
}

impl SubscriptionTarget {
    /// Convert target kind to its database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTarget::Publisher => "publisher",
            SubscriptionTarget::Journalist => "journalist",
        }
    }

    /// Parse target kind from its database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "publisher" => Some(SubscriptionTarget::Publisher),
            "journalist" => Some(SubscriptionTarget::Journalist),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reader's subscriptions resolved to display names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    /// Names of subscribed publishers
    pub publishers: Vec<String>,
    /// Usernames of subscribed journalists
    pub journalists: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_roundtrip() {
        assert_eq!(
            SubscriptionTarget::from_str("publisher"),
            Some(SubscriptionTarget::Publisher)
        );
        assert_eq!(
            SubscriptionTarget::from_str("Journalist"),
            Some(SubscriptionTarget::Journalist)
        );
        assert_eq!(SubscriptionTarget::from_str("editor"), None);
    }
}
