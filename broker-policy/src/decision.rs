//! Enablement decisions and the rule that produced them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule that decided a tool's enablement, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum EnablementRule {
    /// The picker explicitly disabled the tool.
    PickerDisabled,
    /// The caller's filter returned a value.
    Filter,
    /// A referenced tool carries an `enable_other_tool_<name>` tag.
    UnlockedByReference {
        /// Canonical name of the referenced tool.
        by: String,
    },
    /// The picker never saw the tool and it was installed by another tool.
    InstalledByTool,
    /// The picker explicitly enabled the tool.
    PickerEnabled,
    /// No rule applied.
    Default,
}

impl fmt::Display for EnablementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PickerDisabled => f.write_str("picker_disabled"),
            Self::Filter => f.write_str("filter"),
            Self::UnlockedByReference { by } => write!(f, "unlocked_by_reference({by})"),
            Self::InstalledByTool => f.write_str("installed_by_tool"),
            Self::PickerEnabled => f.write_str("picker_enabled"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Structured outcome of evaluating one tool for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnablementDecision {
    enabled: bool,
    rule: EnablementRule,
}

impl EnablementDecision {
    /// Returns an enabling decision.
    #[must_use]
    pub fn enable(rule: EnablementRule) -> Self {
        Self {
            enabled: true,
            rule,
        }
    }

    /// Returns a disabling decision.
    #[must_use]
    pub fn disable(rule: EnablementRule) -> Self {
        Self {
            enabled: false,
            rule,
        }
    }

    /// Returns true when the tool may run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the rule that decided.
    #[must_use]
    pub fn rule(&self) -> &EnablementRule {
        &self.rule
    }
}
