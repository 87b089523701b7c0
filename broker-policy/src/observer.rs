//! Hooks notified of every enablement decision.

use std::sync::Arc;

use broker_primitives::ToolDescriptor;
use tracing::{debug, trace};

use crate::decision::{EnablementDecision, EnablementRule};

/// Observer invoked whenever an enablement decision is produced.
pub trait DecisionObserver: Send + Sync {
    /// Records the decision made for `tool`.
    fn on_decision(&self, tool: &ToolDescriptor, decision: &EnablementDecision);
}

/// Observer that emits decisions to the tracing system.
#[derive(Debug, Default)]
pub struct TracingDecisionObserver;

impl DecisionObserver for TracingDecisionObserver {
    fn on_decision(&self, tool: &ToolDescriptor, decision: &EnablementDecision) {
        let rule = decision.rule();
        if *rule == EnablementRule::PickerDisabled {
            debug!(tool = tool.name(), %rule, "tool disabled by picker");
        } else {
            trace!(
                tool = tool.name(),
                enabled = decision.is_enabled(),
                %rule,
                "tool enablement decided"
            );
        }
    }
}

/// Composite observer that forwards decisions to a collection of observers.
#[derive(Default)]
pub struct CompositeDecisionObserver {
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl CompositeDecisionObserver {
    /// Creates a new composite observer from the supplied list.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DecisionObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer to the composite set.
    pub fn push(&mut self, observer: Arc<dyn DecisionObserver>) {
        self.observers.push(observer);
    }
}

impl DecisionObserver for CompositeDecisionObserver {
    fn on_decision(&self, tool: &ToolDescriptor, decision: &EnablementDecision) {
        for observer in &self.observers {
            observer.on_decision(tool, decision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    impl DecisionObserver for Recording {
        fn on_decision(&self, tool: &ToolDescriptor, _decision: &EnablementDecision) {
            self.seen.lock().unwrap().push(tool.name().to_owned());
        }
    }

    #[test]
    fn composite_forwards_to_every_observer() {
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        let mut composite = CompositeDecisionObserver::new([
            first.clone() as Arc<dyn DecisionObserver>,
            Arc::new(TracingDecisionObserver) as Arc<dyn DecisionObserver>,
        ]);
        composite.push(second.clone());

        let tool = ToolDescriptor::new("alpha", "").unwrap();
        composite.on_decision(&tool, &EnablementDecision::disable(EnablementRule::Default));

        assert_eq!(*first.seen.lock().unwrap(), ["alpha"]);
        assert_eq!(*second.seen.lock().unwrap(), ["alpha"]);
    }
}
