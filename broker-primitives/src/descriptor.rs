//! Tool descriptors shared by the catalog, ownership, and enablement layers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Tag marking a tool that was contributed mid-session by something another
/// tool installed.
pub const EXTENSION_INSTALLED_BY_TOOL_TAG: &str = "extension_installed_by_tool";

/// Prefix of tags that let a referenced tool unlock another tool by name.
pub const ENABLE_OTHER_TOOL_TAG_PREFIX: &str = "enable_other_tool_";

/// Returns the tag a tool must carry to unlock `name` when referenced.
#[must_use]
pub fn enable_other_tool_tag(name: &str) -> String {
    format!("{ENABLE_OTHER_TOOL_TAG_PREFIX}{name}")
}

/// Describes a tool exposed by the host.
///
/// The same shape carries both the host's raw form (keyed by the host's raw
/// name) and the canonical form produced by the catalog transform. Every
/// construction path, deserialization included, validates the name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct ToolDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

/// Unvalidated wire form of [`ToolDescriptor`].
#[derive(Deserialize)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input_schema: Option<Value>,
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl TryFrom<RawDescriptor> for ToolDescriptor {
    type Error = Error;

    fn try_from(raw: RawDescriptor) -> Result<Self> {
        Ok(Self::new(raw.name, raw.description)?
            .with_input_schema(raw.input_schema)
            .with_tags(raw.tags))
    }
}

/// Checks that `name` is usable as a tool name.
///
/// # Errors
///
/// Returns [`Error::InvalidToolName`] if the name is blank or contains
/// whitespace.
pub fn validate_tool_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "tool name cannot be empty"
    } else if name.chars().any(char::is_whitespace) {
        "tool name cannot contain whitespace"
    } else {
        return Ok(());
    };
    Err(Error::InvalidToolName {
        name: name.to_owned(),
        reason: reason.into(),
    })
}

impl ToolDescriptor {
    /// Creates a descriptor for the supplied name and description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] if the name is blank or contains
    /// whitespace.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_tool_name(&name)?;

        Ok(Self {
            name,
            description: description.into(),
            input_schema: None,
            tags: BTreeSet::new(),
        })
    }

    /// Replaces the name, keeping every other field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] and leaves the descriptor unchanged
    /// if the new name is invalid.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_tool_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets or clears the JSON input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Option<Value>) -> Self {
        self.input_schema = schema;
        self
    }

    /// Adds a tag, ignoring blank values.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !tag.trim().is_empty() {
            self.tags.insert(tag);
        }
        self
    }

    /// Adds several tags.
    #[must_use]
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter().fold(self, |tool, tag| tool.with_tag(tag))
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON input schema, if any.
    #[must_use]
    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    /// Returns the tags attached to the tool.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns `true` when the tool carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns `true` when referencing this tool unlocks `other`.
    #[must_use]
    pub fn enables(&self, other: &str) -> bool {
        self.tags
            .iter()
            .filter_map(|tag| tag.strip_prefix(ENABLE_OTHER_TOOL_TAG_PREFIX))
            .any(|target| target == other)
    }
}
