//! Publisher service
//!
//! Implements manager-level business logic for publishers:
//! - Create, read, update, delete publishers
//! - Manage journalist and editor affiliations

use crate::db::repositories::{PublisherRepository, UserRepository};
use crate::models::{
    CreatePublisherInput, Publisher, PublisherWithStaff, Role, UpdatePublisherInput, User,
};
use anyhow::Context;
use std::sync::Arc;

/// Error types for publisher service operations
#[derive(Debug, thiserror::Error)]
pub enum PublisherServiceError {
    /// The caller is not a manager
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Publisher or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A publisher with this name already exists
    #[error("Publisher name already exists: {0}")]
    DuplicateName(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Publisher service for manager administration
pub struct PublisherService {
    repo: Arc<dyn PublisherRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl PublisherService {
    /// Create a new publisher service
    pub fn new(repo: Arc<dyn PublisherRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { repo, user_repo }
    }

    /// Create a publisher (managers only). Names are unique.
    pub async fn create(
        &self,
        actor: &User,
        input: CreatePublisherInput,
    ) -> Result<Publisher, PublisherServiceError> {
        self.ensure_manager(actor)?;

        if input.name.trim().is_empty() {
            return Err(PublisherServiceError::Validation(
                "Publisher name cannot be empty".to_string(),
            ));
        }

        if self
            .repo
            .get_by_name(&input.name)
            .await
            .context("Failed to check publisher name")?
            .is_some()
        {
            return Err(PublisherServiceError::DuplicateName(input.name));
        }

        let publisher = self
            .repo
            .create(&input)
            .await
            .context("Failed to create publisher")?;

        Ok(publisher)
    }

    /// List publishers, optionally filtered by a search term
    pub async fn list(
        &self,
        actor: &User,
        search: Option<&str>,
    ) -> Result<Vec<Publisher>, PublisherServiceError> {
        self.ensure_manager(actor)?;

        let publishers = self
            .repo
            .list(search)
            .await
            .context("Failed to list publishers")?;

        Ok(publishers)
    }

    /// Fetch a publisher together with its affiliated staff
    pub async fn get_with_staff(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<PublisherWithStaff, PublisherServiceError> {
        self.ensure_manager(actor)?;

        let publisher = self.get_publisher(id).await?;
        let journalists = self
            .repo
            .journalist_names(id)
            .await
            .context("Failed to list journalists")?;
        let editors = self
            .repo
            .editor_names(id)
            .await
            .context("Failed to list editors")?;

        Ok(PublisherWithStaff {
            publisher,
            journalists,
            editors,
        })
    }

    /// Update a publisher's name or description
    pub async fn update(
        &self,
        actor: &User,
        id: i64,
        input: UpdatePublisherInput,
    ) -> Result<Publisher, PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(PublisherServiceError::Validation(
                    "Publisher name cannot be empty".to_string(),
                ));
            }
            if let Some(existing) = self
                .repo
                .get_by_name(name)
                .await
                .context("Failed to check publisher name")?
            {
                if existing.id != id {
                    return Err(PublisherServiceError::DuplicateName(name.clone()));
                }
            }
        }

        let publisher = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update publisher")?;

        Ok(publisher)
    }

    /// Delete a publisher
    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(id).await?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete publisher")?;

        Ok(())
    }

    /// Affiliate a journalist with a publisher. The user must hold the
    /// Journalist role.
    pub async fn add_journalist(
        &self,
        actor: &User,
        publisher_id: i64,
        user_id: i64,
    ) -> Result<(), PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(publisher_id).await?;
        self.ensure_user_role(user_id, Role::Journalist).await?;

        self.repo
            .add_journalist(publisher_id, user_id)
            .await
            .context("Failed to add journalist")?;

        Ok(())
    }

    /// Remove a journalist affiliation
    pub async fn remove_journalist(
        &self,
        actor: &User,
        publisher_id: i64,
        user_id: i64,
    ) -> Result<(), PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(publisher_id).await?;

        self.repo
            .remove_journalist(publisher_id, user_id)
            .await
            .context("Failed to remove journalist")?;

        Ok(())
    }

    /// Affiliate an editor with a publisher. The user must hold the Editor
    /// role.
    pub async fn add_editor(
        &self,
        actor: &User,
        publisher_id: i64,
        user_id: i64,
    ) -> Result<(), PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(publisher_id).await?;
        self.ensure_user_role(user_id, Role::Editor).await?;

        self.repo
            .add_editor(publisher_id, user_id)
            .await
            .context("Failed to add editor")?;

        Ok(())
    }

    /// Remove an editor affiliation
    pub async fn remove_editor(
        &self,
        actor: &User,
        publisher_id: i64,
        user_id: i64,
    ) -> Result<(), PublisherServiceError> {
        self.ensure_manager(actor)?;
        self.get_publisher(publisher_id).await?;

        self.repo
            .remove_editor(publisher_id, user_id)
            .await
            .context("Failed to remove editor")?;

        Ok(())
    }

    fn ensure_manager(&self, actor: &User) -> Result<(), PublisherServiceError> {
        if !actor.is_manager() {
            return Err(PublisherServiceError::PermissionDenied(
                "Only managers can administer publishers".to_string(),
            ));
        }
        Ok(())
    }

    async fn get_publisher(&self, id: i64) -> Result<Publisher, PublisherServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get publisher")?
            .ok_or_else(|| PublisherServiceError::NotFound(format!("Publisher {} not found", id)))
    }

    async fn ensure_user_role(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<(), PublisherServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| PublisherServiceError::NotFound(format!("User {} not found", user_id)))?;

        if user.role != role {
            return Err(PublisherServiceError::Validation(format!(
                "User '{}' does not hold the {} role",
                user.username, role
            )));
        }

        Ok(())
    }
}
