//! Content service
//!
//! Implements business logic for articles and newsletters:
//! - Authoring (create, update, delete, list own)
//! - The approval workflow (submit, approve, reject, resubmit)
//! - The reader-facing visibility queries
//!
//! The workflow is a small state machine over `ContentStatus`:
//! `Draft -> PendingApproval -> Approved | Rejected`, with
//! `Rejected -> PendingApproval` for resubmission. Approved is terminal.
//! Every transition goes through the repository's compare-and-swap, so a lost
//! race surfaces as `InvalidTransition` rather than a double transition, and
//! the approval event is emitted exactly once, after the status commit.

use crate::db::repositories::{ContentRepository, PublisherRepository};
use crate::models::{
    ContentItem, ContentKind, ContentStatus, CreateContentInput, ListParams, UpdateContentInput,
    User,
};
use crate::notify::{ContentApproved, NotificationDispatcher};
use crate::services::markdown::render_markdown;
use anyhow::Context;
use std::sync::Arc;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// The caller's role or affiliation does not allow the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The item is not in a state the requested transition starts from
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Referenced item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Content service for authoring and the approval workflow
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    publisher_repo: Arc<dyn PublisherRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ContentService {
    /// Create a new content service
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        publisher_repo: Arc<dyn PublisherRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            publisher_repo,
            dispatcher,
        }
    }

    /// Create a new content item authored by `actor`.
    ///
    /// Independent items (no publisher) become Approved immediately and are
    /// visible to every reader from this point on. Publisher-owned items start
    /// as Draft, or as PendingApproval when `submit_now` is set; either way the
    /// author must be an affiliated journalist of that publisher.
    pub async fn create(
        &self,
        actor: &User,
        mut input: CreateContentInput,
        submit_now: bool,
    ) -> Result<ContentItem, ContentServiceError> {
        if !actor.is_journalist() {
            return Err(ContentServiceError::PermissionDenied(
                "Only journalists can create content".to_string(),
            ));
        }
        input.author_id = actor.id;

        if input.title.trim().is_empty() {
            return Err(ContentServiceError::Validation("Title cannot be empty".to_string()));
        }
        if input.body.trim().is_empty() {
            return Err(ContentServiceError::Validation("Body cannot be empty".to_string()));
        }

        let status = match input.publisher_id {
            Some(publisher_id) => {
                self.publisher_repo
                    .get_by_id(publisher_id)
                    .await
                    .context("Failed to look up publisher")?
                    .ok_or_else(|| {
                        ContentServiceError::NotFound(format!("Publisher {} not found", publisher_id))
                    })?;

                if !self
                    .publisher_repo
                    .is_journalist(publisher_id, actor.id)
                    .await
                    .context("Failed to check affiliation")?
                {
                    return Err(ContentServiceError::PermissionDenied(
                        "You are not an affiliated journalist of this publisher".to_string(),
                    ));
                }

                if submit_now {
                    ContentStatus::PendingApproval
                } else {
                    ContentStatus::Draft
                }
            }
            // Independent items bypass approval entirely
            None => ContentStatus::Approved,
        };

        let body_html = render_markdown(&input.body);

        let item = self
            .repo
            .create(&input, &body_html, status)
            .await
            .context("Failed to create content item")?;

        Ok(item)
    }

    /// Fetch an item for its author or an editor of its publisher
    pub async fn get_for_staff(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;
        self.ensure_author_or_editor(actor, &item).await?;
        Ok(item)
    }

    /// List the items authored by `actor`
    pub async fn list_own(
        &self,
        actor: &User,
        kind: Option<ContentKind>,
        search: Option<&str>,
    ) -> Result<Vec<ContentItem>, ContentServiceError> {
        if !actor.is_journalist() {
            return Err(ContentServiceError::PermissionDenied(
                "Only journalists have an authoring dashboard".to_string(),
            ));
        }

        let items = self
            .repo
            .list_by_author(actor.id, kind, search)
            .await
            .context("Failed to list own content")?;

        Ok(items)
    }

    /// List the items belonging to publishers `actor` edits for
    pub async fn review_queue(
        &self,
        actor: &User,
        pending_only: bool,
    ) -> Result<Vec<ContentItem>, ContentServiceError> {
        if !actor.is_editor() {
            return Err(ContentServiceError::PermissionDenied(
                "Only editors have a review queue".to_string(),
            ));
        }

        let items = self
            .repo
            .list_for_editor(actor.id, pending_only)
            .await
            .context("Failed to list review queue")?;

        Ok(items)
    }

    /// Update the title/body of an item.
    ///
    /// Only the author may edit, and only while the item is Draft,
    /// PendingApproval, or Rejected. Approved is terminal; allowing edits
    /// there would reopen the question of re-notification.
    pub async fn update(
        &self,
        actor: &User,
        id: i64,
        input: UpdateContentInput,
    ) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;

        if item.author_id != actor.id {
            return Err(ContentServiceError::PermissionDenied(
                "Only the author can edit this item".to_string(),
            ));
        }
        if item.status == ContentStatus::Approved {
            return Err(ContentServiceError::InvalidTransition(
                "Approved items can no longer be edited".to_string(),
            ));
        }
        if !input.has_changes() {
            return Ok(item);
        }

        let title = input.title.as_deref().unwrap_or(&item.title);
        let body = input.body.as_deref().unwrap_or(&item.body);
        if title.trim().is_empty() {
            return Err(ContentServiceError::Validation("Title cannot be empty".to_string()));
        }
        if body.trim().is_empty() {
            return Err(ContentServiceError::Validation("Body cannot be empty".to_string()));
        }

        let body_html = render_markdown(body);

        self.repo
            .update_body(id, title, body, &body_html)
            .await
            .context("Failed to update content item")?;

        self.get_item(id).await
    }

    /// Delete an item: the author may, and so may an editor affiliated with
    /// the item's publisher
    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), ContentServiceError> {
        let item = self.get_item(id).await?;
        self.ensure_author_or_editor(actor, &item).await?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete content item")?;

        Ok(())
    }

    /// Submit a draft for editorial approval (Draft -> PendingApproval)
    pub async fn submit(&self, actor: &User, id: i64) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;
        self.ensure_submittable_by(actor, &item).await?;

        let moved = self
            .repo
            .transition_status(id, ContentStatus::Draft, ContentStatus::PendingApproval, None)
            .await
            .context("Failed to submit item")?;

        if !moved {
            return Err(ContentServiceError::InvalidTransition(
                "Only drafts can be submitted".to_string(),
            ));
        }

        self.get_item(id).await
    }

    /// Resubmit a rejected item (Rejected -> PendingApproval)
    pub async fn resubmit(&self, actor: &User, id: i64) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;
        self.ensure_submittable_by(actor, &item).await?;

        let moved = self
            .repo
            .transition_status(id, ContentStatus::Rejected, ContentStatus::PendingApproval, None)
            .await
            .context("Failed to resubmit item")?;

        if !moved {
            return Err(ContentServiceError::InvalidTransition(
                "Only rejected items can be resubmitted".to_string(),
            ));
        }

        self.get_item(id).await
    }

    /// Approve a pending item (PendingApproval -> Approved).
    ///
    /// Of two racing approvals, exactly one wins the compare-and-swap; only
    /// the winner emits the `ContentApproved` event, and only after the status
    /// change is committed. A failed dispatch is logged and does not undo the
    /// approval.
    pub async fn approve(&self, actor: &User, id: i64) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;
        let publisher_id = self.ensure_reviewable_by(actor, &item).await?;

        let moved = self
            .repo
            .transition_status(
                id,
                ContentStatus::PendingApproval,
                ContentStatus::Approved,
                Some(actor.id),
            )
            .await
            .context("Failed to approve item")?;

        if !moved {
            return Err(ContentServiceError::InvalidTransition(
                "Item is not pending approval".to_string(),
            ));
        }

        // The status change is committed; the event fires exactly once, here.
        let event = ContentApproved {
            item_id: id,
            publisher_id,
        };
        if let Err(e) = self.dispatcher.notify(event).await {
            tracing::warn!("Notification dispatch failed for item {}: {}", id, e);
        }

        self.get_item(id).await
    }

    /// Reject a pending item (PendingApproval -> Rejected). No event.
    pub async fn reject(&self, actor: &User, id: i64) -> Result<ContentItem, ContentServiceError> {
        let item = self.get_item(id).await?;
        self.ensure_reviewable_by(actor, &item).await?;

        let moved = self
            .repo
            .transition_status(id, ContentStatus::PendingApproval, ContentStatus::Rejected, None)
            .await
            .context("Failed to reject item")?;

        if !moved {
            return Err(ContentServiceError::InvalidTransition(
                "Item is not pending approval".to_string(),
            ));
        }

        self.get_item(id).await
    }

    /// The reader's feed: every item visible to them, newest first.
    ///
    /// Backed by the repository's single visibility predicate, the same one
    /// used for single-item lookups.
    pub async fn visible_feed(
        &self,
        actor: &User,
        kind: Option<ContentKind>,
        params: &ListParams,
    ) -> Result<Vec<ContentItem>, ContentServiceError> {
        if !actor.is_reader() {
            return Err(ContentServiceError::PermissionDenied(
                "Only readers have a content feed".to_string(),
            ));
        }

        let items = self
            .repo
            .list_visible_to(actor.id, kind, params.offset(), params.limit())
            .await
            .context("Failed to list visible content")?;

        Ok(items)
    }

    /// Fetch a single item if it is visible to the reader
    pub async fn visible_item(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<ContentItem, ContentServiceError> {
        if !actor.is_reader() {
            return Err(ContentServiceError::PermissionDenied(
                "Only readers have a content feed".to_string(),
            ));
        }

        self.repo
            .get_visible_to(actor.id, id)
            .await
            .context("Failed to fetch visible content item")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Content item {} not found", id)))
    }

    async fn get_item(&self, id: i64) -> Result<ContentItem, ContentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to fetch content item")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Content item {} not found", id)))
    }

    /// Guard for submit/resubmit: the authoring journalist, on a
    /// publisher-owned item they are still affiliated with
    async fn ensure_submittable_by(
        &self,
        actor: &User,
        item: &ContentItem,
    ) -> Result<(), ContentServiceError> {
        if !actor.is_journalist() || item.author_id != actor.id {
            return Err(ContentServiceError::PermissionDenied(
                "Only the authoring journalist can submit this item".to_string(),
            ));
        }

        let publisher_id = item.publisher_id.ok_or_else(|| {
            ContentServiceError::PermissionDenied(
                "Independent items are not subject to approval".to_string(),
            )
        })?;

        if !self
            .publisher_repo
            .is_journalist(publisher_id, actor.id)
            .await
            .context("Failed to check affiliation")?
        {
            return Err(ContentServiceError::PermissionDenied(
                "You are not an affiliated journalist of this publisher".to_string(),
            ));
        }

        Ok(())
    }

    /// Guard for approve/reject: an editor affiliated with the item's
    /// publisher. Returns the publisher ID for the event payload.
    async fn ensure_reviewable_by(
        &self,
        actor: &User,
        item: &ContentItem,
    ) -> Result<i64, ContentServiceError> {
        let publisher_id = item.publisher_id.ok_or_else(|| {
            ContentServiceError::InvalidTransition(
                "Independent items are not subject to approval".to_string(),
            )
        })?;

        if !actor.is_editor() {
            return Err(ContentServiceError::PermissionDenied(
                "Only editors can review content".to_string(),
            ));
        }

        if !self
            .publisher_repo
            .is_editor(publisher_id, actor.id)
            .await
            .context("Failed to check affiliation")?
        {
            return Err(ContentServiceError::PermissionDenied(
                "You are not an affiliated editor of this publisher".to_string(),
            ));
        }

        Ok(publisher_id)
    }

    async fn ensure_author_or_editor(
        &self,
        actor: &User,
        item: &ContentItem,
    ) -> Result<(), ContentServiceError> {
        if item.author_id == actor.id {
            return Ok(());
        }

        if actor.is_editor() {
            if let Some(publisher_id) = item.publisher_id {
                if self
                    .publisher_repo
                    .is_editor(publisher_id, actor.id)
                    .await
                    .context("Failed to check affiliation")?
                {
                    return Ok(());
                }
            }
        }

        Err(ContentServiceError::PermissionDenied(
            "You cannot access this item".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        PublisherRepository, SqlxContentRepository, SqlxPublisherRepository,
        SqlxSubscriptionRepository, SqlxUserRepository, SubscriptionRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreatePublisherInput, Role, SubscriptionTarget};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Dispatcher that records every event it receives
    struct RecordingDispatcher {
        count: AtomicUsize,
        events: Mutex<Vec<ContentApproved>>,
    }

    impl RecordingDispatcher {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
                events: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        async fn notify(&self, event: ContentApproved) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct Fixture {
        service: ContentService,
        dispatcher: Arc<RecordingDispatcher>,
        user_repo: SqlxUserRepository,
        publisher_repo: SqlxPublisherRepository,
        subscription_repo: SqlxSubscriptionRepository,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let dispatcher = Arc::new(RecordingDispatcher::new());
        let service = ContentService::new(
            SqlxContentRepository::boxed(pool.clone()),
            SqlxPublisherRepository::boxed(pool.clone()),
            dispatcher.clone(),
        );

        Fixture {
            service,
            dispatcher,
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
                description: "Test publisher".to_string(),
            })
            .await
            .expect("create publisher")
            .id
    }

    fn article_input(publisher_id: Option<i64>) -> CreateContentInput {
        CreateContentInput {
            kind: ContentKind::Article,
            title: "Breaking story".to_string(),
            body: "Something happened.".to_string(),
            author_id: 0,
            publisher_id,
        }
    }

    #[tokio::test]
    async fn test_independent_item_is_approved_on_creation() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "indy", Role::Journalist).await;

        let item = fx
            .service
            .create(&journalist, article_input(None), false)
            .await
            .expect("create");

        assert_eq!(item.status, ContentStatus::Approved);
        assert!(item.approved_at.is_some());
        assert!(item.approved_by.is_none());
        // Becoming visible is not an approval transition, so no event
        assert_eq!(fx.dispatcher.count(), 0);
    }

    #[tokio::test]
    async fn test_independent_item_visible_to_reader_without_subscriptions() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "indy", Role::Journalist).await;
        let reader = make_user(&fx, "reader", Role::Reader).await;

        let item = fx
            .service
            .create(&journalist, article_input(None), false)
            .await
            .expect("create");

        let feed = fx
            .service
            .visible_feed(&reader, None, &ListParams::default())
            .await
            .expect("feed");

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, item.id);
    }

    #[tokio::test]
    async fn test_create_requires_journalist_role() {
        let fx = fixture().await;
        let reader = make_user(&fx, "reader", Role::Reader).await;

        let result = fx.service.create(&reader, article_input(None), false).await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_create_for_unaffiliated_publisher_denied() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;

        let result = fx
            .service
            .create(&journalist, article_input(Some(publisher_id)), false)
            .await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_submit_moves_draft_to_pending() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");

        let item = fx
            .service
            .create(&journalist, article_input(Some(publisher_id)), false)
            .await
            .expect("create");
        assert_eq!(item.status, ContentStatus::Draft);

        let item = fx.service.submit(&journalist, item.id).await.expect("submit");
        assert_eq!(item.status, ContentStatus::PendingApproval);

        // Submitting twice is a state error, not a permission error
        let result = fx.service.submit(&journalist, item.id).await;
        assert!(matches!(result, Err(ContentServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_submit_by_other_journalist_denied() {
        let fx = fixture().await;
        let author = make_user(&fx, "author", Role::Journalist).await;
        let other = make_user(&fx, "other", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, author.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_journalist(publisher_id, other.id)
            .await
            .expect("affiliate");

        let item = fx
            .service
            .create(&author, article_input(Some(publisher_id)), false)
            .await
            .expect("create");

        let result = fx.service.submit(&other, item.id).await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_submit_after_losing_affiliation_denied() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");

        let item = fx
            .service
            .create(&journalist, article_input(Some(publisher_id)), false)
            .await
            .expect("create");

        fx.publisher_repo
            .remove_journalist(publisher_id, journalist.id)
            .await
            .expect("unaffiliate");

        let result = fx.service.submit(&journalist, item.id).await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
    }

    async fn pending_item(fx: &Fixture, journalist: &User, publisher_id: i64) -> ContentItem {
        let item = fx
            .service
            .create(journalist, article_input(Some(publisher_id)), true)
            .await
            .expect("create");
        assert_eq!(item.status, ContentStatus::PendingApproval);
        item
    }

    #[tokio::test]
    async fn test_approve_happy_path_emits_one_event() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;

        let approved = fx.service.approve(&editor, item.id).await.expect("approve");
        assert_eq!(approved.status, ContentStatus::Approved);
        assert_eq!(approved.approved_by, Some(editor.id));
        assert!(approved.approved_at.is_some());

        assert_eq!(fx.dispatcher.count(), 1);
        let events = fx.dispatcher.events.lock().unwrap();
        assert_eq!(
            events[0],
            ContentApproved {
                item_id: item.id,
                publisher_id,
            }
        );
    }

    #[tokio::test]
    async fn test_approve_by_unaffiliated_editor_denied() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let outsider = make_user(&fx, "outsider", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;

        let result = fx.service.approve(&outsider, item.id).await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
        assert_eq!(fx.dispatcher.count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_approvals_produce_one_winner_and_one_event() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor_a = make_user(&fx, "editor_a", Role::Editor).await;
        let editor_b = make_user(&fx, "editor_b", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor_a.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor_b.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;

        let (first, second) = tokio::join!(
            fx.service.approve(&editor_a, item.id),
            fx.service.approve(&editor_b, item.id),
        );

        let outcomes = [first, second];
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        let losses = outcomes
            .iter()
            .filter(|r| matches!(r, Err(ContentServiceError::InvalidTransition(_))))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(losses, 1);
        assert_eq!(fx.dispatcher.count(), 1);
    }

    #[tokio::test]
    async fn test_reject_resubmit_approve_roundtrip() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;

        let rejected = fx.service.reject(&editor, item.id).await.expect("reject");
        assert_eq!(rejected.status, ContentStatus::Rejected);
        assert_eq!(fx.dispatcher.count(), 0);

        let resubmitted = fx
            .service
            .resubmit(&journalist, item.id)
            .await
            .expect("resubmit");
        assert_eq!(resubmitted.status, ContentStatus::PendingApproval);

        let approved = fx.service.approve(&editor, item.id).await.expect("approve");
        assert_eq!(approved.status, ContentStatus::Approved);

        // Only the final approval fires the event
        assert_eq!(fx.dispatcher.count(), 1);
    }

    #[tokio::test]
    async fn test_update_approved_item_refused() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "indy", Role::Journalist).await;

        let item = fx
            .service
            .create(&journalist, article_input(None), false)
            .await
            .expect("create");
        assert_eq!(item.status, ContentStatus::Approved);

        let result = fx
            .service
            .update(
                &journalist,
                item.id,
                UpdateContentInput {
                    title: Some("Amended".to_string()),
                    body: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ContentServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_update_draft_rerenders_body() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");

        let item = fx
            .service
            .create(&journalist, article_input(Some(publisher_id)), false)
            .await
            .expect("create");

        let updated = fx
            .service
            .update(
                &journalist,
                item.id,
                UpdateContentInput {
                    title: None,
                    body: Some("# Updated".to_string()),
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.body, "# Updated");
        assert!(updated.body_html.contains("<h1>Updated</h1>"));
    }

    #[tokio::test]
    async fn test_visibility_follows_subscriptions() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let indy = make_user(&fx, "indy", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let reader_a = make_user(&fx, "reader_a", Role::Reader).await;
        let reader_b = make_user(&fx, "reader_b", Role::Reader).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        // Reader A follows the publisher; reader B follows nothing
        fx.subscription_repo
            .add(reader_a.id, SubscriptionTarget::Publisher, publisher_id)
            .await
            .expect("subscribe");

        // X: publisher-owned, submitted and approved
        let x = pending_item(&fx, &journalist, publisher_id).await;
        fx.service.approve(&editor, x.id).await.expect("approve");

        // Y: independent, visible to everyone immediately
        let y = fx
            .service
            .create(&indy, article_input(None), false)
            .await
            .expect("create");

        let feed_a = fx
            .service
            .visible_feed(&reader_a, None, &ListParams::default())
            .await
            .expect("feed a");
        let ids_a: Vec<i64> = feed_a.iter().map(|i| i.id).collect();
        assert!(ids_a.contains(&x.id));
        assert!(ids_a.contains(&y.id));

        let feed_b = fx
            .service
            .visible_feed(&reader_b, None, &ListParams::default())
            .await
            .expect("feed b");
        let ids_b: Vec<i64> = feed_b.iter().map(|i| i.id).collect();
        assert!(!ids_b.contains(&x.id));
        assert!(ids_b.contains(&y.id));

        // The single-item lookup applies the same predicate
        assert!(fx.service.visible_item(&reader_a, x.id).await.is_ok());
        assert!(matches!(
            fx.service.visible_item(&reader_b, x.id).await,
            Err(ContentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_journalist_subscription_reveals_publisher_content() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        // The reader follows the journalist, not the publisher
        fx.subscription_repo
            .add(reader.id, SubscriptionTarget::Journalist, journalist.id)
            .await
            .expect("subscribe");

        let item = pending_item(&fx, &journalist, publisher_id).await;
        fx.service.approve(&editor, item.id).await.expect("approve");

        let feed = fx
            .service
            .visible_feed(&reader, None, &ListParams::default())
            .await
            .expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, item.id);
    }

    #[tokio::test]
    async fn test_pending_items_are_never_visible() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let reader = make_user(&fx, "reader", Role::Reader).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.subscription_repo
            .add(reader.id, SubscriptionTarget::Publisher, publisher_id)
            .await
            .expect("subscribe");

        pending_item(&fx, &journalist, publisher_id).await;

        let feed = fx
            .service
            .visible_feed(&reader, None, &ListParams::default())
            .await
            .expect("feed");
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_review_queue_scoped_to_affiliation() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let other_editor = make_user(&fx, "other", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;

        let queue = fx.service.review_queue(&editor, true).await.expect("queue");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, item.id);

        let other_queue = fx
            .service
            .review_queue(&other_editor, true)
            .await
            .expect("queue");
        assert!(other_queue.is_empty());
    }

    #[tokio::test]
    async fn test_feed_requires_reader_role() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;

        let result = fx
            .service
            .visible_feed(&journalist, None, &ListParams::default())
            .await;
        assert!(matches!(result, Err(ContentServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_kind_filter_separates_articles_and_newsletters() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "indy", Role::Journalist).await;
        let reader = make_user(&fx, "reader", Role::Reader).await;

        fx.service
            .create(&journalist, article_input(None), false)
            .await
            .expect("article");
        fx.service
            .create(
                &journalist,
                CreateContentInput {
                    kind: ContentKind::Newsletter,
                    title: "Weekly digest".to_string(),
                    body: "This week in news.".to_string(),
                    author_id: 0,
                    publisher_id: None,
                },
                false,
            )
            .await
            .expect("newsletter");

        let articles = fx
            .service
            .visible_feed(&reader, Some(ContentKind::Article), &ListParams::default())
            .await
            .expect("articles");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].kind, ContentKind::Article);

        let newsletters = fx
            .service
            .visible_feed(&reader, Some(ContentKind::Newsletter), &ListParams::default())
            .await
            .expect("newsletters");
        assert_eq!(newsletters.len(), 1);
        assert_eq!(newsletters[0].kind, ContentKind::Newsletter);
    }

    #[tokio::test]
    async fn test_delete_by_affiliated_editor() {
        let fx = fixture().await;
        let journalist = make_user(&fx, "jsmith", Role::Journalist).await;
        let editor = make_user(&fx, "editor", Role::Editor).await;
        let publisher_id = make_publisher(&fx, "The Daily").await;
        fx.publisher_repo
            .add_journalist(publisher_id, journalist.id)
            .await
            .expect("affiliate");
        fx.publisher_repo
            .add_editor(publisher_id, editor.id)
            .await
            .expect("affiliate");

        let item = pending_item(&fx, &journalist, publisher_id).await;
        fx.service.delete(&editor, item.id).await.expect("delete");

        let result = fx.service.get_for_staff(&journalist, item.id).await;
        assert!(matches!(result, Err(ContentServiceError::NotFound(_))));
    }
}
