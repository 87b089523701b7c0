//! Read-through cache over the host's live tool list.
//!
//! The host sends no change notification, so every read compares the live
//! list with the last input snapshot and recomputes the transformed catalog
//! only when they differ (element-wise, order-sensitive).

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};

use broker_primitives::ToolDescriptor;
use tracing::{debug, trace};

use crate::host::ToolHost;
use crate::names::NameMapper;
use crate::ownership::OwnershipRegistry;

struct CacheEntry {
    input: Arc<[ToolDescriptor]>,
    output: Arc<[ToolDescriptor]>,
}

/// Sorted, renamed, owner-overridden view of the host's tools.
pub struct ToolCatalog {
    host: Arc<dyn ToolHost>,
    names: Arc<NameMapper>,
    ownership: Arc<OwnershipRegistry>,
    builtin_prefixes: Vec<String>,
    cache: RwLock<Option<CacheEntry>>,
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|entry| entry.output.len());
        f.debug_struct("ToolCatalog")
            .field("builtin_prefixes", &self.builtin_prefixes)
            .field("cached_tools", &cached)
            .finish_non_exhaustive()
    }
}

impl ToolCatalog {
    /// Creates a catalog over `host`.
    ///
    /// Tools whose raw name starts with one of `builtin_prefixes` sort ahead of
    /// every other tool.
    #[must_use]
    pub fn new(
        host: Arc<dyn ToolHost>,
        names: Arc<NameMapper>,
        ownership: Arc<OwnershipRegistry>,
        builtin_prefixes: Vec<String>,
    ) -> Self {
        Self {
            host,
            names,
            ownership,
            builtin_prefixes,
            cache: RwLock::new(None),
        }
    }

    /// Returns the canonical tool list, recomputing it only when the host's
    /// live list changed since the last read.
    #[must_use]
    pub fn tools(&self) -> Arc<[ToolDescriptor]> {
        let live = self.host.list_tools();

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.as_ref() {
                if Arc::ptr_eq(&entry.input, &live) || *entry.input == *live {
                    trace!(tools = entry.output.len(), "tool catalog cache hit");
                    return Arc::clone(&entry.output);
                }
            }
        }

        let output: Arc<[ToolDescriptor]> = self.transform(&live).into();
        debug!(tools = output.len(), "tool catalog recomputed");

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *cache = Some(CacheEntry {
            input: live,
            output: Arc::clone(&output),
        });
        output
    }

    /// Looks up a tool by canonical or raw name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolDescriptor> {
        let canonical = self.names.to_canonical(name);
        self.tools()
            .iter()
            .find(|tool| tool.name() == canonical)
            .cloned()
    }

    /// Drops the cached snapshot so the next read recomputes.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the name mapper used by the catalog.
    #[must_use]
    pub fn names(&self) -> &Arc<NameMapper> {
        &self.names
    }

    /// Returns the ownership registry consulted for overrides.
    #[must_use]
    pub fn ownership(&self) -> &Arc<OwnershipRegistry> {
        &self.ownership
    }

    fn is_builtin(&self, raw_name: &str) -> bool {
        self.builtin_prefixes
            .iter()
            .any(|prefix| raw_name.starts_with(prefix.as_str()))
    }

    fn compare(&self, a: &ToolDescriptor, b: &ToolDescriptor) -> Ordering {
        self.is_builtin(b.name())
            .cmp(&self.is_builtin(a.name()))
            .then_with(|| a.name().cmp(b.name()))
    }

    fn transform(&self, live: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        let mut sorted: Vec<&ToolDescriptor> = live.iter().collect();
        sorted.sort_by(|a, b| self.compare(a, b));

        sorted
            .into_iter()
            .map(|tool| {
                let canonical = self.names.to_canonical(tool.name());
                let tool = self
                    .ownership
                    .owned_tool(canonical)
                    .and_then(|owned| owned.alternative_definition(tool, None))
                    .unwrap_or_else(|| tool.clone());
                self.names.canonicalize(tool)
            })
            .collect()
    }
}
