//! Mapping between the host's raw tool names and canonical tool names.
//!
//! Descriptions and input schemas routinely mention other tools by name, so
//! the mapper rewrites every whole-token occurrence of a raw name in free text
//! and in nested schema strings, not just the `name` field.

use std::borrow::Cow;
use std::collections::HashMap;

use broker_primitives::{ToolDescriptor, validate_tool_name};
use regex::{Captures, Regex};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Result alias for name mapping operations.
pub type NameMapResult<T> = Result<T, NameMapError>;

/// Errors raised while building a [`NameMapper`].
#[derive(Debug, Error)]
pub enum NameMapError {
    /// One side of a mapping was blank.
    #[error("name mapping `{raw}` -> `{canonical}` has an empty side")]
    EmptyName {
        /// Raw side of the mapping.
        raw: String,
        /// Canonical side of the mapping.
        canonical: String,
    },
    /// A canonical name would itself be rewritten, breaking idempotence.
    #[error("canonical name `{canonical}` contains a raw tool name")]
    CanonicalShadowsRaw {
        /// Offending canonical name.
        canonical: String,
    },
    /// Two raw names map onto the same canonical name.
    #[error("raw names `{first}` and `{second}` both map to `{canonical}`")]
    DuplicateCanonical {
        /// Shared canonical name.
        canonical: String,
        /// First raw name.
        first: String,
        /// Second raw name.
        second: String,
    },
    /// A canonical name is not a valid tool name.
    #[error(transparent)]
    InvalidName(#[from] broker_primitives::Error),
    /// The token pattern could not be compiled.
    #[error("failed to compile name pattern: {source}")]
    Pattern {
        /// Source regex error.
        #[from]
        source: regex::Error,
    },
}

/// Bidirectional raw/canonical tool name table.
///
/// Names absent from the table pass through unchanged in both directions.
#[derive(Debug, Clone, Default)]
pub struct NameMapper {
    to_canonical: HashMap<String, String>,
    to_raw: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl NameMapper {
    /// Builds a mapper from `(raw, canonical)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`NameMapError`] when a name is blank, a canonical name is
    /// shared by two raw names, or a canonical name contains a raw name token.
    pub fn new<I, R, C>(mappings: I) -> NameMapResult<Self>
    where
        I: IntoIterator<Item = (R, C)>,
        R: Into<String>,
        C: Into<String>,
    {
        let mut to_canonical = HashMap::new();
        let mut to_raw: HashMap<String, String> = HashMap::new();

        for (raw, canonical) in mappings {
            let (raw, canonical) = (raw.into(), canonical.into());
            if raw.trim().is_empty() || canonical.trim().is_empty() {
                return Err(NameMapError::EmptyName { raw, canonical });
            }
            validate_tool_name(&canonical)?;
            if let Some(first) = to_raw.get(&canonical) {
                if *first != raw {
                    return Err(NameMapError::DuplicateCanonical {
                        canonical,
                        first: first.clone(),
                        second: raw,
                    });
                }
            }
            to_raw.insert(canonical.clone(), raw.clone());
            to_canonical.insert(raw, canonical);
        }

        let pattern = build_pattern(to_canonical.keys().map(String::as_str))?;
        if let Some(pattern) = &pattern {
            if let Some(canonical) = to_raw.keys().find(|name| pattern.is_match(name)) {
                return Err(NameMapError::CanonicalShadowsRaw {
                    canonical: canonical.clone(),
                });
            }
        }

        Ok(Self {
            to_canonical,
            to_raw,
            pattern,
        })
    }

    /// Creates a mapper that leaves every name untouched.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Returns the canonical name for a raw name.
    #[must_use]
    pub fn to_canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.to_canonical.get(raw).map_or(raw, String::as_str)
    }

    /// Returns the raw host name for a canonical or contributed name.
    #[must_use]
    pub fn to_raw<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_raw.get(name).map_or(name, String::as_str)
    }

    /// Rewrites every raw tool name token in `text`.
    #[must_use]
    pub fn rewrite_names_in_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, |caps: &Captures<'_>| {
                self.to_canonical(&caps[0]).to_owned()
            }),
            None => Cow::Borrowed(text),
        }
    }

    /// Rewrites raw tool names in every string nested inside `schema`.
    #[must_use]
    pub fn rewrite_names_in_schema(&self, schema: &Value) -> Value {
        match schema {
            Value::String(text) => Value::String(self.rewrite_names_in_text(text).into_owned()),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.rewrite_names_in_schema(item))
                    .collect(),
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), self.rewrite_names_in_schema(value)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Canonicalizes a descriptor's name, description, and input schema.
    #[must_use]
    pub fn canonicalize(&self, descriptor: ToolDescriptor) -> ToolDescriptor {
        let name = self.to_canonical(descriptor.name()).to_owned();
        let description = self
            .rewrite_names_in_text(descriptor.description())
            .into_owned();
        let schema = descriptor
            .input_schema()
            .map(|schema| self.rewrite_names_in_schema(schema));

        let mut descriptor = descriptor
            .with_description(description)
            .with_input_schema(schema);
        // Mapped names are validated on construction and unmapped names are
        // the descriptor's own.
        if let Err(err) = descriptor.rename(name) {
            warn!(%err, tool = descriptor.name(), "keeping host tool name");
        }
        descriptor
    }

    /// Returns the number of mapped names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    /// Returns `true` when no names are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }
}

fn build_pattern<'a>(raw_names: impl Iterator<Item = &'a str>) -> NameMapResult<Option<Regex>> {
    let mut names: Vec<&str> = raw_names.collect();
    if names.is_empty() {
        return Ok(None);
    }
    // Longest first so a name never loses to one of its own prefixes.
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternatives: Vec<String> = names
        .into_iter()
        .map(|name| {
            let start = if starts_with_word_char(name) { r"\b" } else { "" };
            let end = if ends_with_word_char(name) { r"\b" } else { "" };
            format!("{start}{}{end}", regex::escape(name))
        })
        .collect();

    Ok(Some(Regex::new(&alternatives.join("|"))?))
}

fn starts_with_word_char(name: &str) -> bool {
    name.chars().next().is_some_and(is_word_char)
}

fn ends_with_word_char(name: &str) -> bool {
    name.chars().next_back().is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
