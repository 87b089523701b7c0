//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// The document was not valid JSON for the schema.
    #[error("failed to parse config: {source}")]
    Parse {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// A field held a value the broker cannot run with.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
