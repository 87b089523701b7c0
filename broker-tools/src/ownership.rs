//! Ownership of tools implemented inside the broker and of definition
//! overrides contributed by extensions.
//!
//! Both maps are built lazily from the registered classes on first access and
//! never rebuilt. Ownership is independent of the host's live list: an owned
//! tool the host does not expose is simply never surfaced.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use broker_primitives::{Endpoint, ToolDescriptor};
use tracing::{debug, warn};

/// A tool implementation owned by the broker.
pub trait OwnedTool: Send + Sync {
    /// Canonical name of the tool this instance implements.
    fn name(&self) -> &str;

    /// Returns a replacement definition for `descriptor`, tailored to
    /// `endpoint` when one is known. `None` keeps the host's definition.
    fn alternative_definition(
        &self,
        descriptor: &ToolDescriptor,
        endpoint: Option<&Endpoint>,
    ) -> Option<ToolDescriptor> {
        let _ = (descriptor, endpoint);
        None
    }
}

/// An external override of an existing tool's definition.
///
/// Applied after the owned tool's override, so extensions win.
pub trait ToolExtension: Send + Sync {
    /// Canonical name of the tool this extension overrides.
    fn name(&self) -> &str;

    /// Returns a replacement definition for `descriptor`.
    fn alternative_definition(
        &self,
        descriptor: &ToolDescriptor,
        endpoint: Option<&Endpoint>,
    ) -> Option<ToolDescriptor> {
        let _ = (descriptor, endpoint);
        None
    }
}

/// Registration of an owned tool type, known at process start.
#[derive(Clone, Copy)]
pub struct ToolClass {
    name: &'static str,
    construct: fn() -> Arc<dyn OwnedTool>,
}

impl ToolClass {
    /// Declares a tool class for the canonical `name`.
    #[must_use]
    pub const fn new(name: &'static str, construct: fn() -> Arc<dyn OwnedTool>) -> Self {
        Self { name, construct }
    }

    /// Returns the canonical tool name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the class constructor.
    #[must_use]
    pub fn construct(&self) -> Arc<dyn OwnedTool> {
        (self.construct)()
    }
}

impl fmt::Debug for ToolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolClass").field("name", &self.name).finish()
    }
}

/// Registration of a tool extension type, known at process start.
#[derive(Clone, Copy)]
pub struct ExtensionClass {
    name: &'static str,
    construct: fn() -> Arc<dyn ToolExtension>,
}

impl ExtensionClass {
    /// Declares an extension class overriding the canonical `name`.
    #[must_use]
    pub const fn new(name: &'static str, construct: fn() -> Arc<dyn ToolExtension>) -> Self {
        Self { name, construct }
    }

    /// Returns the canonical name of the overridden tool.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the class constructor.
    #[must_use]
    pub fn construct(&self) -> Arc<dyn ToolExtension> {
        (self.construct)()
    }
}

impl fmt::Debug for ExtensionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionClass")
            .field("name", &self.name)
            .finish()
    }
}

inventory::collect!(ToolClass);
inventory::collect!(ExtensionClass);

/// Constructs tool and extension instances from their classes.
pub trait Instantiator: Send + Sync {
    /// Creates the instance for an owned tool class.
    fn instantiate_tool(&self, class: &ToolClass) -> Arc<dyn OwnedTool>;

    /// Creates the instance for an extension class.
    fn instantiate_extension(&self, class: &ExtensionClass) -> Arc<dyn ToolExtension>;
}

/// Instantiator that calls each class constructor directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectInstantiator;

impl Instantiator for DirectInstantiator {
    fn instantiate_tool(&self, class: &ToolClass) -> Arc<dyn OwnedTool> {
        class.construct()
    }

    fn instantiate_extension(&self, class: &ExtensionClass) -> Arc<dyn ToolExtension> {
        class.construct()
    }
}

/// Lazily built maps from canonical name to owned tool and to extension.
pub struct OwnershipRegistry {
    tool_classes: Vec<ToolClass>,
    extension_classes: Vec<ExtensionClass>,
    instantiator: Arc<dyn Instantiator>,
    tools: OnceLock<HashMap<String, Arc<dyn OwnedTool>>>,
    extensions: OnceLock<HashMap<String, Arc<dyn ToolExtension>>>,
}

impl fmt::Debug for OwnershipRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipRegistry")
            .field("tool_classes", &self.tool_classes)
            .field("extension_classes", &self.extension_classes)
            .field("tools_built", &self.tools.get().is_some())
            .field("extensions_built", &self.extensions.get().is_some())
            .finish_non_exhaustive()
    }
}

impl OwnershipRegistry {
    /// Creates a registry over the supplied classes.
    #[must_use]
    pub fn new(
        tool_classes: Vec<ToolClass>,
        extension_classes: Vec<ExtensionClass>,
        instantiator: Arc<dyn Instantiator>,
    ) -> Self {
        Self {
            tool_classes,
            extension_classes,
            instantiator,
            tools: OnceLock::new(),
            extensions: OnceLock::new(),
        }
    }

    /// Creates a registry over every class submitted with `inventory::submit!`.
    #[must_use]
    pub fn from_inventory(instantiator: Arc<dyn Instantiator>) -> Self {
        Self::new(
            inventory::iter::<ToolClass>.into_iter().copied().collect(),
            inventory::iter::<ExtensionClass>
                .into_iter()
                .copied()
                .collect(),
            instantiator,
        )
    }

    /// Creates a registry that owns nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Arc::new(DirectInstantiator))
    }

    /// Returns the owned tool for a canonical name.
    #[must_use]
    pub fn owned_tool(&self, name: &str) -> Option<Arc<dyn OwnedTool>> {
        self.tools
            .get_or_init(|| {
                build_map(&self.tool_classes, ToolClass::name, |class| {
                    self.instantiator.instantiate_tool(class)
                })
            })
            .get(name)
            .cloned()
    }

    /// Returns the extension overriding a canonical name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<Arc<dyn ToolExtension>> {
        self.extensions
            .get_or_init(|| {
                build_map(&self.extension_classes, ExtensionClass::name, |class| {
                    self.instantiator.instantiate_extension(class)
                })
            })
            .get(name)
            .cloned()
    }
}

fn build_map<C, T: ?Sized>(
    classes: &[C],
    name_of: impl Fn(&C) -> &'static str,
    instantiate: impl Fn(&C) -> Arc<T>,
) -> HashMap<String, Arc<T>> {
    let mut map = HashMap::with_capacity(classes.len());
    for class in classes {
        let name = name_of(class);
        if map.contains_key(name) {
            warn!(tool = name, "duplicate ownership registration ignored");
            continue;
        }
        map.insert(name.to_owned(), instantiate(class));
    }
    debug!(count = map.len(), "ownership map built");
    map
}
