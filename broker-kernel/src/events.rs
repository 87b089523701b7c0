//! Invocation lifecycle events and the channel that carries them.

use broker_primitives::CorrelationId;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Event emitted around every tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationEvent {
    /// Emitted before the host is called.
    WillInvoke {
        /// Canonical tool name.
        tool_name: String,
        /// Correlation identifier shared by the matching [`InvocationEvent::DidInvoke`].
        correlation_id: CorrelationId,
    },
    /// Emitted exactly once when the invocation settles, whatever the outcome.
    DidInvoke {
        /// Canonical tool name.
        tool_name: String,
        /// Correlation identifier shared with the matching [`InvocationEvent::WillInvoke`].
        correlation_id: CorrelationId,
    },
}

impl InvocationEvent {
    /// Returns the canonical tool name.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::WillInvoke { tool_name, .. } | Self::DidInvoke { tool_name, .. } => tool_name,
        }
    }

    /// Returns the correlation identifier.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::WillInvoke { correlation_id, .. } | Self::DidInvoke { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

/// Broadcast channel fanning invocation events out to subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<InvocationEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    ///
    /// A receiver more than `capacity` events behind skips the oldest ones
    /// and observes [`broadcast::error::RecvError::Lagged`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InvocationEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: InvocationEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(tool = event.tool_name(), "no invocation event subscribers");
        }
    }
}
