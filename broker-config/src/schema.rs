//! Strongly typed configuration schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Raw host names and the canonical names the broker exposes for them.
const DEFAULT_NAME_MAPPINGS: &[(&str, &str)] = &[
    ("copilot_readFile", "read_file"),
    ("copilot_findFiles", "file_search"),
    ("copilot_findTextInFiles", "grep_search"),
    ("copilot_searchCodebase", "semantic_search"),
    ("copilot_runInTerminal", "run_in_terminal"),
    ("copilot_getErrors", "get_errors"),
    ("copilot_installExtension", "install_extension"),
    ("vscode_get_confirmation", "get_confirmation"),
    ("vscode_get_terminal_confirmation", "get_terminal_confirmation"),
];

/// Top-level broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Raw-name prefixes marking built-in tools, which sort ahead of the rest.
    pub builtin_prefixes: Vec<String>,
    /// Canonical names of confirmation tools subject to auto-allow.
    pub confirmation_tools: Vec<String>,
    /// Buffer size of the invocation event channel.
    pub event_capacity: usize,
    /// Raw host name to canonical name table.
    pub name_mappings: BTreeMap<String, String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            builtin_prefixes: vec!["copilot_".into(), "vscode_".into()],
            confirmation_tools: vec![
                "get_confirmation".into(),
                "get_terminal_confirmation".into(),
            ],
            event_capacity: DEFAULT_EVENT_CAPACITY,
            name_mappings: DEFAULT_NAME_MAPPINGS
                .iter()
                .map(|(raw, canonical)| ((*raw).to_owned(), (*canonical).to_owned()))
                .collect(),
        }
    }
}

impl BrokerConfig {
    /// Returns `true` when `canonical` names a confirmation tool.
    #[must_use]
    pub fn is_confirmation_tool(&self, canonical: &str) -> bool {
        self.confirmation_tools.iter().any(|name| name == canonical)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a prefix or tool name is blank or
    /// the event capacity is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.builtin_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "built-in prefixes cannot be empty".into(),
            ));
        }
        if self.confirmation_tools.iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "confirmation tool names cannot be empty".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event capacity must be greater than zero".into(),
            ));
        }
        if let Some((raw, canonical)) = self
            .name_mappings
            .iter()
            .find(|(raw, canonical)| raw.trim().is_empty() || canonical.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "name mapping `{raw}` -> `{canonical}` has an empty side"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BrokerConfig::default();
        config.validate().unwrap();
        assert!(config.is_confirmation_tool("get_confirmation"));
        assert!(!config.is_confirmation_tool("read_file"));
        assert_eq!(
            config.name_mappings.get("copilot_readFile").map(String::as_str),
            Some("read_file")
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = BrokerConfig {
            event_capacity: 0,
            ..BrokerConfig::default()
        };
        let err = config.validate().expect_err("zero capacity should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn blank_mapping_is_rejected() {
        let mut config = BrokerConfig::default();
        config.name_mappings.insert("copilot_x".into(), " ".into());
        let err = config.validate().expect_err("blank canonical should fail");
        assert!(err.to_string().contains("copilot_x"));
    }
}
