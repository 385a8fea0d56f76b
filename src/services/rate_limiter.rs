//! Rate limiter for login attempts
//!
//! Limits failed login attempts per username (5 attempts per 15 minutes) to
//! slow down credential guessing.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maximum failed attempts per username inside the window
const MAX_ATTEMPTS: usize = 5;

/// Attempt window in minutes
const WINDOW_MINUTES: i64 = 15;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts by username
    attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if the username is currently rate limited
    pub async fn is_limited(&self, username: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);

        let entry = attempts.entry(username.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);

        entry.len() >= MAX_ATTEMPTS
    }

    /// Record a failed login attempt for the username
    pub async fn record_failure(&self, username: &str) {
        let mut attempts = self.attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear failed attempts for the username (on successful login)
    pub async fn clear(&self, username: &str) {
        let mut attempts = self.attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Drop stale entries; called periodically from a background task
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
