//! Facade tying the catalog, enablement, and invocation together.

use std::fmt;
use std::sync::Arc;

use broker_config::BrokerConfig;
use broker_policy::{
    ChatRequest, DecisionObserver, EnablementEngine, ToolFilter, TracingDecisionObserver,
};
use broker_primitives::{Endpoint, ToolDescriptor, ToolOutput};
use broker_tools::catalog::ToolCatalog;
use broker_tools::host::{HostResult, InvocationOptions, ToolHost};
use broker_tools::names::NameMapper;
use broker_tools::ownership::{DirectInstantiator, OwnedTool, OwnershipRegistry};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::events::{EventBus, InvocationEvent};
use crate::invoke::InvocationOrchestrator;

/// Entry point for listing, enabling, and invoking tools.
pub struct ToolsService {
    catalog: Arc<ToolCatalog>,
    engine: EnablementEngine,
    orchestrator: InvocationOrchestrator,
}

impl fmt::Debug for ToolsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsService")
            .field("catalog", &self.catalog)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl ToolsService {
    /// Builds a service over `host` using the supplied ownership registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] when the configuration is invalid and
    /// [`ServiceError::NameMap`] when its name table is inconsistent.
    pub fn new(
        host: Arc<dyn ToolHost>,
        ownership: Arc<OwnershipRegistry>,
        config: &BrokerConfig,
    ) -> ServiceResult<Self> {
        config.validate()?;

        let names = Arc::new(NameMapper::new(
            config
                .name_mappings
                .iter()
                .map(|(raw, canonical)| (raw.as_str(), canonical.as_str())),
        )?);
        let catalog = Arc::new(ToolCatalog::new(
            Arc::clone(&host),
            Arc::clone(&names),
            ownership,
            config.builtin_prefixes.clone(),
        ));
        let engine = EnablementEngine::new(Arc::clone(&catalog))
            .with_observer(Arc::new(TracingDecisionObserver));
        let orchestrator =
            InvocationOrchestrator::new(host, names, EventBus::new(config.event_capacity))
                .with_confirmation_tools(config.confirmation_tools.iter().cloned());

        debug!(
            mappings = config.name_mappings.len(),
            confirmation_tools = config.confirmation_tools.len(),
            "tools service ready"
        );
        Ok(Self {
            catalog,
            engine,
            orchestrator,
        })
    }

    /// Builds a service whose owned tools and extensions are the classes
    /// registered with `inventory::submit!`.
    ///
    /// # Errors
    ///
    /// See [`ToolsService::new`].
    pub fn from_inventory(host: Arc<dyn ToolHost>, config: &BrokerConfig) -> ServiceResult<Self> {
        let ownership = OwnershipRegistry::from_inventory(Arc::new(DirectInstantiator));
        Self::new(host, Arc::new(ownership), config)
    }

    /// Replaces the decision observer, returning the updated service.
    #[must_use]
    pub fn with_decision_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.engine.set_observer(observer);
        self
    }

    /// Returns every tool, canonicalized, built-ins first.
    #[must_use]
    pub fn tools(&self) -> Arc<[ToolDescriptor]> {
        self.catalog.tools()
    }

    /// Returns the tools enabled for `request`.
    #[must_use]
    pub fn enabled_tools(
        &self,
        request: &ChatRequest,
        endpoint: Option<&Endpoint>,
        filter: Option<&ToolFilter>,
    ) -> Vec<ToolDescriptor> {
        self.engine.enabled_tools(request, endpoint, filter)
    }

    /// Returns the broker-owned implementation for a raw or canonical name.
    #[must_use]
    pub fn get_owned_tool(&self, name: &str) -> Option<Arc<dyn OwnedTool>> {
        let canonical = self.catalog.names().to_canonical(name);
        self.catalog.ownership().owned_tool(canonical)
    }

    /// Looks up a catalog tool by raw or canonical name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.catalog.get(name)
    }

    /// Invokes a tool; see [`InvocationOrchestrator::invoke`].
    ///
    /// # Errors
    ///
    /// Returns the host's error unchanged.
    pub async fn invoke(
        &self,
        name: &str,
        options: InvocationOptions,
        token: &CancellationToken,
    ) -> HostResult<ToolOutput> {
        self.orchestrator.invoke(name, options, token).await
    }

    /// Subscribes to `WillInvoke` / `DidInvoke` events.
    ///
    /// The channel holds `event_capacity` events per subscriber. A receiver
    /// that falls further behind loses the oldest events and gets
    /// [`broadcast::error::RecvError::Lagged`] with the number skipped before
    /// receiving resumes, so consumers that need every event must handle it.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InvocationEvent> {
        self.orchestrator.events().subscribe()
    }

    /// Replaces a tool definition in place. Only test doubles support this.
    ///
    /// # Errors
    ///
    /// Always returns [`ServiceError::Unsupported`].
    pub fn override_tool_for_test(
        &self,
        _name: &str,
        _descriptor: ToolDescriptor,
    ) -> ServiceResult<()> {
        Err(ServiceError::Unsupported {
            operation: "override_tool_for_test",
        })
    }

    /// Returns the catalog backing the service.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }
}
