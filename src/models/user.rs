//! User model
//!
//! This module defines the User entity and the role vocabulary for the
//! newsroom system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered user in the system.
///
/// Every user holds exactly one role (Reader, Journalist, Editor, Manager)
/// which determines what they can do. Journalists and editors additionally
/// gain per-publisher rights through affiliations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: Role,
    /// Optional phone number
    pub phone_number: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            role,
            phone_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is a reader
    pub fn is_reader(&self) -> bool {
        self.role == Role::Reader
    }

    /// Check if the user is a journalist
    pub fn is_journalist(&self) -> bool {
        self.role == Role::Journalist
    }

    /// Check if the user is an editor
    pub fn is_editor(&self) -> bool {
        self.role == Role::Editor
    }

    /// Check if the user is a publisher manager
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// User role for authorization.
///
/// Each user holds exactly one role:
/// - Reader: subscribes to publishers/journalists and reads approved content
/// - Journalist: authors articles and newsletters
/// - Editor: approves or rejects content for affiliated publishers
/// - Manager: administers publishers and affiliations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reader - subscribes and reads
    Reader,
    /// Journalist - authors content
    Journalist,
    /// Editor - approves publisher content
    Editor,
    /// Manager - administers publishers
    Manager,
}

impl Default for Role {
    fn default() -> Self {
        Self::Reader
    }
}

impl Role {
    /// Convert role to its database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Journalist => "journalist",
            Role::Editor => "editor",
            Role::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reader" => Ok(Role::Reader),
            "journalist" => Ok(Role::Journalist),
            "editor" => Ok(Role::Editor),
            "manager" => Ok(Role::Manager),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Role assigned to the new account (defaults to Reader)
    pub role: Option<Role>,
    /// Optional phone number
    pub phone_number: Option<String>,
}

/// Input for updating a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New role (optional)
    pub role: Option<Role>,
    /// New phone number (optional)
    pub phone_number: Option<String>,
}
