//! Error types for the configuration store

use std::path::PathBuf;

use thiserror::Error;

use crate::validator::ValidationError;

/// Result type for configuration store operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration store errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file for '{kind}' not found at {}", .path.display())]
    NotFound { kind: String, path: PathBuf },

    #[error("Failed to parse {format} config at {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Failed to serialize '{kind}' config as {format}: {message}")]
    Serialize {
        kind: String,
        format: &'static str,
        message: String,
    },

    #[error("Schema order error in '{kind}': {reason}")]
    SchemaOrder { kind: String, reason: String },

    #[error("Unknown version v{version} for '{kind}' (latest is v{latest})")]
    UnknownVersion { kind: String, version: u64, latest: u32 },

    #[error("Invalid JSON Schema for '{kind}' v{version}: {message}")]
    InvalidSchema {
        kind: String,
        version: u32,
        message: String,
    },

    #[error("Unsupported config file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Config kind not registered: {0}")]
    UnknownKind(String),

    #[error("Config kind already registered: {0}")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Corrupt '{kind}' config at {}: {reason}", .path.display())]
    CorruptConfig {
        kind: String,
        path: PathBuf,
        #[source]
        reason: Corruption,
    },

    #[error("Default for '{kind}' does not match the latest schema: {source}")]
    DefaultShape {
        kind: String,
        #[source]
        source: ValidationError,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist config to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve config directory: {0}")]
    PathResolution(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config_crate::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an on-disk document could not be brought to the latest version
#[derive(Error, Debug)]
pub enum Corruption {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("migration v{from} -> v{to} failed: {message}")]
    MigrationFailed { from: u32, to: u32, message: String },

    #[error("version field must be a non-negative integer, got {0}")]
    BadVersionField(String),

    #[error("document root is not a mapping")]
    NotAMapping,

    #[error("no schema or migration for v{version} (chain has {schemas} schema(s))")]
    OutOfChain { version: u32, schemas: usize },
}

impl ConfigError {
    /// Whether the caller can recover by initializing the config
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}
