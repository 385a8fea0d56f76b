//! Subscription service
//!
//! Implements business logic for reader subscriptions:
//! - Subscribe to / unsubscribe from publishers and journalists
//! - List a reader's subscriptions resolved to display names
//!
//! Only readers hold subscriptions; at most one exists per (reader, target)
//! pair, and subscribing twice is a no-op.

use crate::db::repositories::{PublisherRepository, SubscriptionRepository, UserRepository};
use crate::models::{Role, SubscriptionSummary, SubscriptionTarget, User};
use anyhow::Context;
use std::sync::Arc;

/// Error types for subscription service operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionServiceError {
    /// The caller is not a reader
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The subscription target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Subscription service for readers
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
    publisher_repo: Arc<dyn PublisherRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl SubscriptionService {
    /// Create a new subscription service
    pub fn new(
        repo: Arc<dyn SubscriptionRepository>,
        publisher_repo: Arc<dyn PublisherRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repo,
            publisher_repo,
            user_repo,
        }
    }

    /// Subscribe the reader to a publisher or journalist
    pub async fn subscribe(
        &self,
        actor: &User,
        target: SubscriptionTarget,
        target_id: i64,
    ) -> Result<(), SubscriptionServiceError> {
        self.ensure_reader(actor)?;
        self.ensure_target_exists(target, target_id).await?;

        self.repo
            .add(actor.id, target, target_id)
            .await
            .context("Failed to add subscription")?;

        Ok(())
    }

    /// Remove the reader's subscription to a publisher or journalist
    pub async fn unsubscribe(
        &self,
        actor: &User,
        target: SubscriptionTarget,
        target_id: i64,
    ) -> Result<(), SubscriptionServiceError> {
        self.ensure_reader(actor)?;

        self.repo
            .remove(actor.id, target, target_id)
            .await
            .context("Failed to remove subscription")?;

        Ok(())
    }

    /// The reader's subscriptions resolved to publisher names and journalist
    /// usernames
    pub async fn my_subscriptions(
        &self,
        actor: &User,
    ) -> Result<SubscriptionSummary, SubscriptionServiceError> {
        self.ensure_reader(actor)?;

        let subscriptions = self
            .repo
            .list_for_reader(actor.id)
            .await
            .context("Failed to list subscriptions")?;

        let mut summary = SubscriptionSummary::default();

        for subscription in subscriptions {
            match subscription.target_kind {
                SubscriptionTarget::Publisher => {
                    if let Some(publisher) = self
                        .publisher_repo
                        .get_by_id(subscription.target_id)
                        .await
                        .context("Failed to resolve publisher")?
                    {
                        summary.publishers.push(publisher.name);
                    }
                }
                SubscriptionTarget::Journalist => {
                    if let Some(journalist) = self
                        .user_repo
                        .get_by_id(subscription.target_id)
                        .await
                        .context("Failed to resolve journalist")?
                    {
                        summary.journalists.push(journalist.username);
                    }
                }
            }
        }

        Ok(summary)
    }

    fn ensure_reader(&self, actor: &User) -> Result<(), SubscriptionServiceError> {
        if !actor.is_reader() {
            return Err(SubscriptionServiceError::PermissionDenied(
                "Only readers hold subscriptions".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_target_exists(
        &self,
        target: SubscriptionTarget,
        target_id: i64,
    ) -> Result<(), SubscriptionServiceError> {
        match target {
            SubscriptionTarget::Publisher => {
                self.publisher_repo
                    .get_by_id(target_id)
                    .await
                    .context("Failed to look up publisher")?
                    .ok_or_else(|| {
                        SubscriptionServiceError::NotFound(format!(
                            "Publisher {} not found",
                            target_id
                        ))
                    })?;
            }
            SubscriptionTarget::Journalist => {
                let user = self
                    .user_repo
                    .get_by_id(target_id)
                    .await
                    .context("Failed to look up journalist")?
                    .ok_or_else(|| {
                        SubscriptionServiceError::NotFound(format!(
                            "Journalist {} not found",
                            target_id
                        ))
                    })?;

                if user.role != Role::Journalist {
                    return Err(SubscriptionServiceError::Validation(format!(
                        "User '{}' is not a journalist",
                        user.username
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxPublisherRepository, SqlxSubscriptionRepository, SqlxUserRepository,
        SubscriptionRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreatePublisherInput;

    struct Fixture {
        service: SubscriptionService,
        user_repo: SqlxUserRepository,
        publisher_repo: SqlxPublisherRepository,
        subscription_repo: SqlxSubscriptionRepository,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        Fixture {
            service: SubscriptionService::new(
                SqlxSubscriptionRepository::boxed(pool.clone()),
                SqlxPublisherRepository::boxed(pool.clone()),
                SqlxUserRepository::boxed(pool.clone()),
            ),
            user_repo: SqlxUserRepository::new(pool.clone()),
            publisher_repo: SqlxPublisherRepository::new(pool.clone()),
            subscription_repo: SqlxSubscriptionRepository::new(pool),
        }
    }

    async fn make_user(fx: &Fixture, username: &str, role: Role) -> User {
        fx.user_repo
            .create(&User::new(
                username.to_string(),
                format!("{}@example.com", username),
                "hash".to_string(),
                role,
            ))
            .await
            .expect("create user")
    }

    async fn make_publisher(fx: &Fixture, name: &str) -> i64 {
        fx.publisher_repo
            .create(&CreatePublisherInput {
                name: name.to_string(),
                description: String::new(),
            })
            .await
            .expect("create publisher")
            .id
    }

    #[tokio::test]
    async fn test_subscribe_and_list() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;

        fx.service
            .subscribe(&reader, SubscriptionTarget::Publisher, publisher_id)
            .await
            .expect("subscribe publisher");
        fx.service
            .subscribe(&reader, SubscriptionTarget::Journalist, journalist.id)
            .await
            .expect("subscribe journalist");

        let summary = fx.service.my_subscriptions(&reader).await.expect("list");
        assert_eq!(summary.publishers, vec!["The Daily".to_string()]);
        assert_eq!(summary.journalists, vec!["jsmith".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_is_a_noop() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;

        for _ in 0..3 {
            fx.service
                .subscribe(&reader, SubscriptionTarget::Publisher, publisher_id)
                .await
                .expect("subscribe");
        }

        let rows = fx
            .subscription_repo
            .list_for_reader(reader.id)
            .await
            .expect("rows");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_non_reader_cannot_subscribe() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;

        let result = fx
            .service
            .subscribe(&journalist, SubscriptionTarget::Publisher, publisher_id)
            .await;
        assert!(matches!(
            result,
            Err(SubscriptionServiceError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribing_to_missing_target_fails() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;

        let result = fx
            .service
            .subscribe(&reader, SubscriptionTarget::Publisher, 999)
            .await;
        assert!(matches!(result, Err(SubscriptionServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_subscribing_to_non_journalist_user_fails() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;

        let result = fx
            .service
            .subscribe(&reader, SubscriptionTarget::Journalist, editor.id)
            .await;
        assert!(matches!(result, Err(SubscriptionServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;

        fx.service
            .subscribe(&reader, SubscriptionTarget::Publisher, publisher_id)
            .await
            .expect("subscribe");
        fx.service
            .unsubscribe(&reader, SubscriptionTarget::Publisher, publisher_id)
            .await
            .expect("unsubscribe");

        let summary = fx.service.my_subscriptions(&reader).await.expect("list");
        assert!(summary.publishers.is_empty());
    }
}
