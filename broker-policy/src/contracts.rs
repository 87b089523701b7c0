//! Request-side inputs to enablement.

use std::collections::HashMap;

use broker_primitives::ToolDescriptor;
use serde::{Deserialize, Serialize};

/// Caller-supplied override consulted after picker denial.
///
/// `Some(enabled)` decides the tool; `None` defers to the remaining rules.
pub type ToolFilter = dyn Fn(&ToolDescriptor) -> Option<bool> + Send + Sync;

/// A tool explicitly referenced within a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReference {
    name: String,
}

impl ToolReference {
    /// Creates a reference to the named tool (raw or canonical).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the referenced name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The parts of a chat request that enablement reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    tools: HashMap<String, bool>,
    #[serde(default)]
    tool_references: Vec<ToolReference>,
}

impl ChatRequest {
    /// Creates a request with no picker selections and no references.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an explicit picker selection for a raw tool name.
    #[must_use]
    pub fn with_picker(mut self, raw_name: impl Into<String>, enabled: bool) -> Self {
        self.tools.insert(raw_name.into(), enabled);
        self
    }

    /// Adds an explicit tool reference.
    #[must_use]
    pub fn with_reference(mut self, name: impl Into<String>) -> Self {
        self.tool_references.push(ToolReference::new(name));
        self
    }

    /// Returns the picker selection for a raw name; `None` when the picker has
    /// no entry at all.
    #[must_use]
    pub fn picker_selection(&self, raw_name: &str) -> Option<bool> {
        self.tools.get(raw_name).copied()
    }

    /// Returns every picker selection.
    #[must_use]
    pub fn tools(&self) -> &HashMap<String, bool> {
        &self.tools
    }

    /// Returns the explicit tool references.
    #[must_use]
    pub fn tool_references(&self) -> &[ToolReference] {
        &self.tool_references
    }
}
