//! Emblem-Crawl: a match-history graph crawler
//!
//! This crate walks the "played-with" graph of a multiplayer game, starting
//! from accounts known to own a rare collectible, and records every account
//! it meets that owns the same collectible.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod provider;
pub mod storage;

use thiserror::Error;

/// Main error type for Emblem-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Provider returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed payload from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("Missing field {field} for {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("Job panicked: {0}")]
    JobPanicked(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Emblem-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Engine};
pub use model::{AccountRef, CollectibleState, DiscoveredAccount};
