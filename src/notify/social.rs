//! Social media posting
//!
//! Posts an announcement for newly approved content to the configured social
//! API. One `SocialClient` is constructed at process start and handed to the
//! notifier; the underlying `reqwest::Client` pools its connections.

use anyhow::{anyhow, Result};
use serde_json::json;

use crate::config::SocialConfig;

/// Maximum characters allowed in a post
const MAX_POST_LEN: usize = 280;

/// Room reserved for the read-more link when a post has to be truncated
const LINK_RESERVE: usize = 80;

/// Client for the social posting API
pub struct SocialClient {
    http: reqwest::Client,
    config: SocialConfig,
}

impl SocialClient {
    /// Create a new client from configuration
    pub fn new(config: SocialConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Check whether posting is enabled and credentialed
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bearer_token.is_empty()
    }

    /// Publish a post
    pub async fn post(&self, text: &str) -> Result<()> {
        if !self.is_enabled() {
            return Err(anyhow!("Social posting is not enabled"));
        }

        let url = format!("{}/2/tweets", self.config.api_base.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.bearer_token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| anyhow!("Social post request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Social post rejected: {}, {}", status, body));
        }

        Ok(())
    }
}

/// Build an announcement post that respects the length limit.
///
/// If the full body fits it is included verbatim; otherwise it is truncated
/// and a read-more link to the item is appended.
pub fn compose_post(publisher_name: &str, author_name: &str, body: &str, item_url: &str) -> String {
    let full = format!(
        "New article published by {}:\nJournalist: {}\n\n{}",
        publisher_name, author_name, body
    );

    if full.chars().count() <= MAX_POST_LEN {
        return full;
    }

    let body_budget = MAX_POST_LEN.saturating_sub(LINK_RESERVE);
    let header = format!(
        "New article published by {}:\nJournalist: {}\n\n",
        publisher_name, author_name
    );
    let header_len = header.chars().count();
    let excerpt: String = body
        .chars()
        .take(body_budget.saturating_sub(header_len))
        .collect();

    format!("{}{}...\nRead more at: {}", header, excerpt, item_url)
}
