//! Core shared types for the tool broker.

#![warn(missing_docs, clippy::pedantic)]

mod descriptor;
mod endpoint;
mod error;
mod ids;
mod output;

/// Tool descriptors and the tag conventions consumed by enablement.
pub use descriptor::{
    ENABLE_OTHER_TOOL_TAG_PREFIX, EXTENSION_INSTALLED_BY_TOOL_TAG, ToolDescriptor,
    enable_other_tool_tag, validate_tool_name,
};
/// Caller/model context handed to definition overrides.
pub use endpoint::Endpoint;
/// Error type and result alias shared across the broker.
pub use error::{Error, Result};
/// Correlation identifier carried by invocation events.
pub use ids::CorrelationId;
/// Structured tool results.
pub use output::{ToolOutput, ToolOutputPart};
