//! Data models
//!
//! This module contains all data structures used throughout the newsroom
//! system. Models represent:
//! - Database entities (User, Publisher, ContentItem, Subscription, Session, ResetToken)
//! - Input types for create/update operations
//! - Internal data transfer objects

mod content;
mod publisher;
mod reset_token;
mod session;
mod subscription;
mod user;

pub use content::{
    ContentItem, ContentKind, ContentStatus, CreateContentInput, ListParams, UpdateContentInput,
};
pub use publisher::{CreatePublisherInput, Publisher, PublisherWithStaff, UpdatePublisherInput};
pub use reset_token::ResetToken;
pub use session::Session;
pub use subscription::{Subscription, SubscriptionSummary, SubscriptionTarget};
pub use user::{CreateUserInput, Role, UpdateUserInput, User};
