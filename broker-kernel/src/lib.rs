//! Invocation orchestration and the tools service facade.
//!
//! [`ToolsService`] wires the catalog cache, the enablement engine, and the
//! [`InvocationOrchestrator`] into the surface callers use. Every invocation
//! is bracketed by [`InvocationEvent`]s published on an [`EventBus`].

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod events;
pub mod invoke;
mod service;

pub use error::{ServiceError, ServiceResult};
pub use events::{EventBus, InvocationEvent};
pub use invoke::{
    AUTO_ALLOW_RESPONSE, AUTO_ALLOW_TIMEOUT, INVOCATION_TIMEOUT, InvocationOrchestrator,
};
pub use service::ToolsService;
