//! Shared error definitions for broker primitives.

use thiserror::Error;

/// Result alias used throughout the broker.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing broker primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Tool name failed validation.
    #[error("invalid tool name `{name}`: {reason}")]
    InvalidToolName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Correlation identifier failed validation.
    #[error("invalid correlation id: {reason}")]
    InvalidCorrelationId {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
