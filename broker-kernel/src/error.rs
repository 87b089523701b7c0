//! Errors raised while assembling or driving the tools service.

use broker_config::ConfigError;
use broker_tools::names::NameMapError;
use thiserror::Error;

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors produced by [`ToolsService`](crate::ToolsService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The configured name table is inconsistent.
    #[error(transparent)]
    NameMap(#[from] NameMapError),
    /// The operation exists only on test doubles.
    #[error("operation `{operation}` is not supported by this service")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },
}
