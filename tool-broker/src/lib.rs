//! Tool broker facade.
//!
//! Sits between chat participants and a host platform's tool registry: lists
//! the host's tools under canonical names, decides per request which tools are
//! enabled, and runs invocations with a global timeout and confirmation
//! auto-allow. The internal crates are bundled behind feature flags.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use broker_primitives as primitives;

/// Invocation orchestration and the tools service (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use broker_kernel as kernel;

/// Catalog cache, name mapping, ownership, and the host seam (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use broker_tools as tools;

/// Per-request enablement (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use broker_policy as policy;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use broker_config as config;
