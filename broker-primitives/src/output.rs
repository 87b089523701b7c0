//! Tool invocation results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single piece of a tool result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutputPart {
    /// Plain text readable by the calling model.
    Text(String),
    /// Structured payload.
    Json(Value),
}

/// Structured result returned by a tool invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    parts: Vec<ToolOutputPart>,
}

impl ToolOutput {
    /// Creates a result from the supplied parts.
    #[must_use]
    pub fn new(parts: Vec<ToolOutputPart>) -> Self {
        Self { parts }
    }

    /// Creates a result holding a single text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ToolOutputPart::Text(text.into())])
    }

    /// Creates a result holding a single JSON part.
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self::new(vec![ToolOutputPart::Json(value)])
    }

    /// Returns the parts of the result.
    #[must_use]
    pub fn parts(&self) -> &[ToolOutputPart] {
        &self.parts
    }

    /// Concatenates every text part, separated by newlines.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ToolOutputPart::Text(text) => Some(text.as_str()),
                ToolOutputPart::Json(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
