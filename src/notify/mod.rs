//! Notification dispatch
//!
//! This module carries the side effects of content approval out of the
//! workflow:
//! - `ContentApproved` is the event emitted exactly once per approval
//! - `NotificationDispatcher` is the seam the workflow talks to
//! - `ApprovalNotifier` is the production dispatcher: it emails subscribed
//!   readers and posts an announcement to the social API, both best-effort
//!
//! Dispatch failures are logged and never reach the editor who approved the
//! item; by the time the dispatcher runs, the status change is already
//! committed.

pub mod email;
pub mod social;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::db::repositories::{
    ContentRepository, PublisherRepository, SubscriptionRepository, UserRepository,
};

pub use email::EmailSender;
pub use social::{compose_post, SocialClient};

/// Event emitted after a content item's approval is durably committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentApproved {
    /// The approved content item
    pub item_id: i64,
    /// The publisher that owns it
    pub publisher_id: i64,
}

/// Receiver of approval events.
///
/// The workflow calls `notify` once per successful approval, after the status
/// commit. Delivery and retry policy belong to the implementation.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Handle a content approval event
    async fn notify(&self, event: ContentApproved) -> Result<()>;
}

/// Production dispatcher: reader emails plus a social post.
///
/// Holds the long-lived `SocialClient` constructed at startup; the workflow
/// never touches the social API directly.
pub struct ApprovalNotifier {
    content_repo: Arc<dyn ContentRepository>,
    publisher_repo: Arc<dyn PublisherRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    user_repo: Arc<dyn UserRepository>,
    email: Arc<EmailSender>,
    social: Arc<SocialClient>,
    site: SiteConfig,
}

impl ApprovalNotifier {
    pub fn new(
        content_repo: Arc<dyn ContentRepository>,
        publisher_repo: Arc<dyn PublisherRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
        user_repo: Arc<dyn UserRepository>,
        email: Arc<EmailSender>,
        social: Arc<SocialClient>,
        site: SiteConfig,
    ) -> Self {
        Self {
            content_repo,
            publisher_repo,
            subscription_repo,
            user_repo,
            email,
            social,
            site,
        }
    }

    fn item_url(&self, item_id: i64) -> String {
        format!("{}/feed/{}", self.site.public_url.trim_end_matches('/'), item_id)
    }

    fn email_body(&self, title: &str, publisher_name: &str, item_url: &str) -> String {
        format!(
            "<html><body>\
             <h2>{} just published: {}</h2>\
             <p><a href=\"{}\">Read the full story</a></p>\
             <p>You are receiving this because you subscribe to {} on {}.</p>\
             </body></html>",
            publisher_name, title, item_url, publisher_name, self.site.name
        )
    }
}

#[async_trait]
impl NotificationDispatcher for ApprovalNotifier {
    async fn notify(&self, event: ContentApproved) -> Result<()> {
        let item = self
            .content_repo
            .get_by_id(event.item_id)
            .await?
            .context("Approved item no longer exists")?;

        let publisher = self
            .publisher_repo
            .get_by_id(event.publisher_id)
            .await?
            .context("Publisher no longer exists")?;

        let author_name = match self.user_repo.get_by_id(item.author_id).await? {
            Some(author) => author.username,
            None => "unknown".to_string(),
        };

        let item_url = self.item_url(item.id);

        // Reader emails: each failure is logged and the loop continues, so
        // one bad address cannot block the rest.
        if self.email.is_configured() {
            let emails = self
                .subscription_repo
                .publisher_subscriber_emails(event.publisher_id)
                .await?;

            let subject = format!("New article has been published by {}", publisher.name);
            let body = self.email_body(&item.title, &publisher.name, &item_url);

            for address in &emails {
                if let Err(e) = self.email.send_html(address, &subject, &body).await {
                    tracing::warn!("Failed to email {}: {}", address, e);
                }
            }
        } else {
            tracing::debug!("SMTP not configured, skipping approval emails");
        }

        if self.social.is_enabled() {
            let post = compose_post(&publisher.name, &author_name, &item.body, &item_url);
            if let Err(e) = self.social.post(&post).await {
                tracing::warn!("Failed to publish social post: {}", e);
            }
        }

        Ok(())
    }
}
