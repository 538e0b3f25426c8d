//! Error types for the calisthenics_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for calisthenics_core operations
///
/// Recommendation and tracking never fail; only loading, parsing and
/// validation surface errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Content pack could not be turned into a catalog and tree store
    #[error("Content error: {0}")]
    Content(String),

    /// Profile persistence error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Skill name that does not map to a known skill
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// Category name that does not map to a workout section
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
