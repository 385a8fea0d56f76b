//! Configuration management
//!
//! This module handles loading and parsing configuration for the newsroom
//! system. Configuration is read from config.yml; missing values are filled
//! with sensible defaults, and a missing file yields the full defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Site configuration
    #[serde(default)]
    pub site: SiteConfig,
    /// SMTP configuration for outgoing email
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Social media posting configuration
    #[serde(default)]
    pub social: SocialConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsroom.db".to_string()
}

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL used in emails and social posts
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Site display name
    #[serde(default = "default_site_name")]
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            name: default_site_name(),
        }
    }
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_site_name() -> String {
    "Newsroom".to_string()
}

/// SMTP configuration for outgoing email
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host; empty disables email sending
    #[serde(default)]
    pub host: String,
    /// SMTP port
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username
    #[serde(default)]
    pub username: String,
    /// SMTP password
    #[serde(default)]
    pub password: String,
    /// From address
    #[serde(default)]
    pub from: String,
    /// From display name
    #[serde(default = "default_site_name")]
    pub from_name: String,
}

impl SmtpConfig {
    /// Check whether enough is configured to send email
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.from.is_empty()
    }
}

fn default_smtp_port() -> u16 {
    587
}

/// Social media posting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Whether posting is enabled
    #[serde(default)]
    pub enabled: bool,
    /// API base URL
    #[serde(default = "default_social_api_base")]
    pub api_base: String,
    /// Bearer token for the posting account
    #[serde(default)]
    pub bearer_token: String,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_social_api_base(),
            bearer_token: String::new(),
        }
    }
}

fn default_social_api_base() -> String {
    "https://api.twitter.com".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults; an existing but invalid
    /// file is an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }
}
