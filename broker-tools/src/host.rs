//! Host platform seam: the live tool list and tool execution.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use broker_primitives::{CorrelationId, ToolDescriptor, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors produced by the host while executing a tool.
///
/// These are propagated to broker callers unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The host does not expose a tool with this raw name.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Raw name that was requested.
        name: String,
    },

    /// A tool with this raw name is already registered.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// The invocation observed its cancellation token.
    #[error("tool invocation was cancelled")]
    Cancelled,

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl HostError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}

/// Opaque invocation payload forwarded to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationOptions {
    #[serde(default)]
    input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl InvocationOptions {
    /// Creates options carrying the supplied tool input.
    #[must_use]
    pub fn new(input: Value) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    /// Attaches the identifier of the request that caused the invocation.
    #[must_use]
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Adds host-specific metadata.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the tool input.
    #[must_use]
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Returns the correlation id, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Returns host-specific metadata.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

/// The host platform that owns the live tool catalog and executes tools.
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Returns the host's current tool list, keyed by raw name.
    ///
    /// The list may change between calls; the host gives no change signal.
    fn list_tools(&self) -> Arc<[ToolDescriptor]>;

    /// Executes the tool registered under `raw_name`.
    async fn invoke_tool(
        &self,
        raw_name: &str,
        options: InvocationOptions,
        token: CancellationToken,
    ) -> HostResult<ToolOutput>;
}

/// Trait implemented by in-process tool executors.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Runs the tool with the given options, observing `token` for cancellation.
    async fn execute(
        &self,
        options: InvocationOptions,
        token: CancellationToken,
    ) -> HostResult<ToolOutput>;
}

#[async_trait]
impl<F, Fut> ToolExecutor for F
where
    F: Send + Sync + Fn(InvocationOptions, CancellationToken) -> Fut,
    Fut: Future<Output = HostResult<ToolOutput>> + Send,
{
    async fn execute(
        &self,
        options: InvocationOptions,
        token: CancellationToken,
    ) -> HostResult<ToolOutput> {
        (self)(options, token).await
    }
}

#[derive(Default)]
struct LocalState {
    descriptors: Arc<[ToolDescriptor]>,
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

/// In-process host keeping tools in registration order.
///
/// Every mutation publishes a fresh list, so readers holding an older list
/// keep a consistent snapshot.
#[derive(Default)]
pub struct LocalToolHost {
    inner: RwLock<LocalState>,
}

impl std::fmt::Debug for LocalToolHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let names: Vec<_> = inner.descriptors.iter().map(ToolDescriptor::name).collect();
        f.debug_struct("LocalToolHost")
            .field("registered", &names)
            .finish()
    }
}

impl LocalToolHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its descriptor's raw name.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DuplicateTool`] if the name is already present.
    pub fn register_tool<T>(&self, descriptor: ToolDescriptor, executor: T) -> HostResult<()>
    where
        T: ToolExecutor + 'static,
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let name = descriptor.name().to_owned();
        if inner.executors.contains_key(&name) {
            return Err(HostError::DuplicateTool { name });
        }

        let mut descriptors = inner.descriptors.to_vec();
        descriptors.push(descriptor);
        inner.descriptors = descriptors.into();
        inner.executors.insert(name, Arc::new(executor));
        Ok(())
    }

    /// Replaces the descriptor of an already registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownTool`] when no tool has that raw name.
    pub fn update_descriptor(&self, descriptor: ToolDescriptor) -> HostResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(position) = inner
            .descriptors
            .iter()
            .position(|tool| tool.name() == descriptor.name())
        else {
            return Err(HostError::UnknownTool {
                name: descriptor.name().to_owned(),
            });
        };

        let mut descriptors = inner.descriptors.to_vec();
        descriptors[position] = descriptor;
        inner.descriptors = descriptors.into();
        Ok(())
    }

    /// Removes a tool, returning `true` if it was registered.
    pub fn remove_tool(&self, raw_name: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.executors.remove(raw_name).is_none() {
            return false;
        }
        let descriptors: Vec<_> = inner
            .descriptors
            .iter()
            .filter(|tool| tool.name() != raw_name)
            .cloned()
            .collect();
        inner.descriptors = descriptors.into();
        true
    }

    fn executor(&self, raw_name: &str) -> Option<Arc<dyn ToolExecutor>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.executors.get(raw_name).cloned()
    }
}

#[async_trait]
impl ToolHost for LocalToolHost {
    fn list_tools(&self) -> Arc<[ToolDescriptor]> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&inner.descriptors)
    }

    async fn invoke_tool(
        &self,
        raw_name: &str,
        options: InvocationOptions,
        token: CancellationToken,
    ) -> HostResult<ToolOutput> {
        let executor = self.executor(raw_name).ok_or_else(|| HostError::UnknownTool {
            name: raw_name.to_owned(),
        })?;
        executor.execute(options, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool").unwrap()
    }

    async fn echo(options: InvocationOptions, _token: CancellationToken) -> HostResult<ToolOutput> {
        Ok(ToolOutput::json(options.input().clone()))
    }

    #[tokio::test]
    async fn register_and_invoke_tool() {
        let host = LocalToolHost::new();
        host.register_tool(descriptor("copilot_echo"), echo).unwrap();

        let payload = json!({ "message": "hello" });
        let output = host
            .invoke_tool(
                "copilot_echo",
                InvocationOptions::new(payload.clone()),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::json(payload));
    }

    #[tokio::test]
    async fn duplicate_registration_errors() {
        let host = LocalToolHost::new();
        host.register_tool(descriptor("copilot_echo"), echo).unwrap();

        let err = host
            .register_tool(descriptor("copilot_echo"), echo)
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, HostError::DuplicateTool { name } if name == "copilot_echo"));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let host = LocalToolHost::new();
        let err = host
            .invoke_tool("missing", InvocationOptions::default(), CancellationToken::new())
            .await
            .expect_err("unknown tool should error");
        assert!(matches!(err, HostError::UnknownTool { name } if name == "missing"));
    }

    #[test]
    fn mutations_publish_new_snapshots() {
        let host = LocalToolHost::new();
        host.register_tool(descriptor("a"), echo).unwrap();
        let before = host.list_tools();

        host.register_tool(descriptor("b"), echo).unwrap();
        let after = host.list_tools();
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);

        host.update_descriptor(descriptor("a").with_tag("changed"))
            .unwrap();
        assert!(host.list_tools()[0].has_tag("changed"));

        assert!(host.remove_tool("a"));
        assert!(!host.remove_tool("a"));
        assert_eq!(host.list_tools().len(), 1);
        assert!(!Arc::ptr_eq(&after, &host.list_tools()));
    }
}
