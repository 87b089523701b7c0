//! Enablement engine evaluated per chat request.

use std::sync::Arc;

use broker_primitives::{EXTENSION_INSTALLED_BY_TOOL_TAG, Endpoint, ToolDescriptor};
use broker_tools::catalog::ToolCatalog;

use crate::contracts::{ChatRequest, ToolFilter};
use crate::decision::{EnablementDecision, EnablementRule};
use crate::observer::DecisionObserver;

/// Decides which catalog tools are enabled for a request.
pub struct EnablementEngine {
    catalog: Arc<ToolCatalog>,
    observer: Option<Arc<dyn DecisionObserver>>,
}

impl std::fmt::Debug for EnablementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnablementEngine")
            .field("catalog", &self.catalog)
            .field("observer_configured", &self.observer.is_some())
            .finish()
    }
}

impl EnablementEngine {
    /// Creates an engine over the supplied catalog.
    #[must_use]
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            observer: None,
        }
    }

    /// Installs a decision observer, returning the updated engine for chaining.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.set_observer(observer);
        self
    }

    /// Installs or replaces the decision observer.
    pub fn set_observer(&mut self, observer: Arc<dyn DecisionObserver>) {
        self.observer = Some(observer);
    }

    /// Returns the catalog the engine reads.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Returns the enabled tools, in catalog order, with owner and extension
    /// overrides for `endpoint` applied.
    #[must_use]
    pub fn enabled_tools(
        &self,
        request: &ChatRequest,
        endpoint: Option<&Endpoint>,
        filter: Option<&ToolFilter>,
    ) -> Vec<ToolDescriptor> {
        let tools = self.catalog.tools();
        let names = self.catalog.names();
        let referenced: Vec<&ToolDescriptor> = request
            .tool_references()
            .iter()
            .filter_map(|reference| {
                let canonical = names.to_canonical(reference.name());
                tools.iter().find(|tool| tool.name() == canonical)
            })
            .collect();

        tools
            .iter()
            .filter_map(|tool| {
                let tool = self.resolve_definition(tool, endpoint);
                let decision = self.evaluate(&tool, request, &referenced, filter);
                if let Some(observer) = &self.observer {
                    observer.on_decision(&tool, &decision);
                }
                decision.is_enabled().then_some(tool)
            })
            .collect()
    }

    /// Applies the owned tool's override, then the extension's on top.
    #[must_use]
    pub fn resolve_definition(
        &self,
        tool: &ToolDescriptor,
        endpoint: Option<&Endpoint>,
    ) -> ToolDescriptor {
        let ownership = self.catalog.ownership();
        let owned = ownership
            .owned_tool(tool.name())
            .and_then(|owned| owned.alternative_definition(tool, endpoint))
            .unwrap_or_else(|| tool.clone());

        ownership
            .extension(tool.name())
            .and_then(|extension| extension.alternative_definition(&owned, endpoint))
            .unwrap_or(owned)
    }

    /// Evaluates the enablement rules for one tool; the first applicable rule
    /// decides.
    #[must_use]
    pub fn evaluate(
        &self,
        tool: &ToolDescriptor,
        request: &ChatRequest,
        referenced: &[&ToolDescriptor],
        filter: Option<&ToolFilter>,
    ) -> EnablementDecision {
        let raw_name = self.catalog.names().to_raw(tool.name());
        let selection = request.picker_selection(raw_name);

        if selection == Some(false) {
            return EnablementDecision::disable(EnablementRule::PickerDisabled);
        }

        if let Some(enabled) = filter.and_then(|filter| filter(tool)) {
            return if enabled {
                EnablementDecision::enable(EnablementRule::Filter)
            } else {
                EnablementDecision::disable(EnablementRule::Filter)
            };
        }

        if let Some(by) = referenced.iter().find(|other| other.enables(tool.name())) {
            return EnablementDecision::enable(EnablementRule::UnlockedByReference {
                by: by.name().to_owned(),
            });
        }

        // Only when the picker has no entry at all; a stale entry is not enough.
        if selection.is_none() && tool.has_tag(EXTENSION_INSTALLED_BY_TOOL_TAG) {
            return EnablementDecision::enable(EnablementRule::InstalledByTool);
        }

        if selection == Some(true) {
            return EnablementDecision::enable(EnablementRule::PickerEnabled);
        }

        EnablementDecision::disable(EnablementRule::Default)
    }
}
