//! Error types for probe configuration.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating probe commands.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read command file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML command file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON command file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported protocol '{0}' (expected http or https)")]
    UnsupportedProtocol(String),

    #[error("empty probe command")]
    EmptyCommand,
}
