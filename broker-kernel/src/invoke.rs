//! Tool invocation with a global timeout, confirmation auto-allow, and
//! lifecycle events.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use broker_primitives::{CorrelationId, ToolOutput};
use broker_tools::host::{HostResult, InvocationOptions, ToolHost};
use broker_tools::names::NameMapper;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{EventBus, InvocationEvent};

/// Upper bound on any single invocation.
pub const INVOCATION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Delay after which a pending confirmation resolves affirmatively.
pub const AUTO_ALLOW_TIMEOUT: Duration = Duration::from_secs(30);

/// Text returned when a confirmation is auto-allowed.
pub const AUTO_ALLOW_RESPONSE: &str = "yes";

/// Runs tool invocations against the host.
///
/// Each call races the host against [`INVOCATION_TIMEOUT`] and, for
/// confirmation tools, [`AUTO_ALLOW_TIMEOUT`]; the first to settle wins and
/// the rest are dropped.
pub struct InvocationOrchestrator {
    host: Arc<dyn ToolHost>,
    names: Arc<NameMapper>,
    confirmation_tools: HashSet<String>,
    events: EventBus,
}

impl fmt::Debug for InvocationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationOrchestrator")
            .field("confirmation_tools", &self.confirmation_tools)
            .finish_non_exhaustive()
    }
}

impl InvocationOrchestrator {
    /// Creates an orchestrator with no confirmation tools.
    #[must_use]
    pub fn new(host: Arc<dyn ToolHost>, names: Arc<NameMapper>, events: EventBus) -> Self {
        Self {
            host,
            names,
            confirmation_tools: HashSet::new(),
            events,
        }
    }

    /// Marks the given canonical names as confirmation tools.
    #[must_use]
    pub fn with_confirmation_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.confirmation_tools
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns `true` when `canonical` is subject to auto-allow.
    #[must_use]
    pub fn is_confirmation_tool(&self, canonical: &str) -> bool {
        self.confirmation_tools.contains(canonical)
    }

    /// Returns the bus invocation events are published on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Invokes `name` (raw or canonical).
    ///
    /// Cancelling `token` cancels the invocation; the orchestrator's own
    /// cancellation never reaches `token`, and once the call settles `token`
    /// no longer affects it. A timeout or auto-allow resolves successfully
    /// with explanatory text.
    ///
    /// # Errors
    ///
    /// Returns the host's error unchanged when the host call fails first.
    pub async fn invoke(
        &self,
        name: &str,
        options: InvocationOptions,
        token: &CancellationToken,
    ) -> HostResult<ToolOutput> {
        let canonical = self.names.to_canonical(name).to_owned();
        let raw_name = self.names.to_raw(&canonical).to_owned();
        let correlation_id = options
            .correlation_id()
            .cloned()
            .unwrap_or_else(CorrelationId::generate);
        let auto_allow = self.is_confirmation_tool(&canonical);

        debug!(tool = %canonical, raw = %raw_name, %correlation_id, "invoking tool");
        self.events.publish(InvocationEvent::WillInvoke {
            tool_name: canonical.clone(),
            correlation_id: correlation_id.clone(),
        });

        // Linked to `token` only while the race below runs.
        let internal = CancellationToken::new();
        let _guard = InvocationGuard {
            events: self.events.clone(),
            tool_name: canonical.clone(),
            correlation_id: correlation_id.clone(),
            _token: internal.clone(),
        };

        let call = self.host.invoke_tool(&raw_name, options, internal.clone());
        let forward = async {
            token.cancelled().await;
            internal.cancel();
            future::pending::<Infallible>().await
        };

        tokio::select! {
            biased;
            result = call => result,
            never = forward => match never {},
            () = tokio::time::sleep(INVOCATION_TIMEOUT) => {
                internal.cancel();
                warn!(
                    tool = %canonical,
                    %correlation_id,
                    timeout_secs = INVOCATION_TIMEOUT.as_secs(),
                    "tool invocation timed out"
                );
                Ok(ToolOutput::text(timeout_message(INVOCATION_TIMEOUT)))
            }
            () = tokio::time::sleep(AUTO_ALLOW_TIMEOUT), if auto_allow => {
                internal.cancel();
                info!(tool = %canonical, %correlation_id, "confirmation auto-allowed");
                Ok(ToolOutput::text(AUTO_ALLOW_RESPONSE))
            }
        }
    }
}

/// Emits `DidInvoke` and releases the internal token when the invocation
/// settles or its future is dropped.
struct InvocationGuard {
    events: EventBus,
    tool_name: String,
    correlation_id: CorrelationId,
    _token: CancellationToken,
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        debug!(
            tool = %self.tool_name,
            correlation_id = %self.correlation_id,
            "tool invocation finished"
        );
        self.events.publish(InvocationEvent::DidInvoke {
            tool_name: std::mem::take(&mut self.tool_name),
            correlation_id: self.correlation_id.clone(),
        });
    }
}

fn timeout_message(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    let duration = if secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{secs} seconds")
    };
    format!(
        "Tool invocation timed out after {duration}. Long-running work should be \
         started in the background and checked on later."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use broker_primitives::ToolDescriptor;
    use broker_tools::host::{HostError, LocalToolHost};
    use futures::future;
    use serde_json::json;
    use tokio::sync::broadcast::Receiver;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::Instant;

    type TokenSlot = Arc<Mutex<Option<CancellationToken>>>;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool").unwrap()
    }

    async fn until_cancelled(token: CancellationToken) -> HostResult<ToolOutput> {
        token.cancelled().await;
        Err(HostError::Cancelled)
    }

    async fn echo(options: InvocationOptions, _token: CancellationToken) -> HostResult<ToolOutput> {
        Ok(ToolOutput::json(options.input().clone()))
    }

    async fn failing(
        _options: InvocationOptions,
        _token: CancellationToken,
    ) -> HostResult<ToolOutput> {
        Err(HostError::execution("disk full"))
    }

    fn register_pending(host: &LocalToolHost, raw_name: &str) -> TokenSlot {
        let slot: TokenSlot = Arc::default();
        let recorder = Arc::clone(&slot);
        host.register_tool(
            tool(raw_name),
            move |_options: InvocationOptions, token: CancellationToken| {
                *recorder.lock().unwrap() = Some(token.clone());
                until_cancelled(token)
            },
        )
        .unwrap();
        slot
    }

    fn orchestrator(
        host: Arc<LocalToolHost>,
    ) -> (InvocationOrchestrator, Receiver<InvocationEvent>) {
        let names = NameMapper::new([
            ("copilot_runInTerminal", "run_in_terminal"),
            ("vscode_get_confirmation", "get_confirmation"),
        ])
        .unwrap();
        let events = EventBus::new(16);
        let receiver = events.subscribe();
        let orchestrator = InvocationOrchestrator::new(host, Arc::new(names), events)
            .with_confirmation_tools(["get_confirmation"]);
        (orchestrator, receiver)
    }

    fn drain(receiver: &mut Receiver<InvocationEvent>) -> Vec<InvocationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn host_result_is_returned_with_events() {
        let host = Arc::new(LocalToolHost::new());
        host.register_tool(tool("copilot_runInTerminal"), echo).unwrap();
        let (orchestrator, mut receiver) = orchestrator(host);

        let id = CorrelationId::new("req-7").unwrap();
        let options = InvocationOptions::new(json!({ "command": "ls" }))
            .with_correlation_id(id.clone());
        let output = orchestrator
            .invoke("run_in_terminal", options, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::json(json!({ "command": "ls" })));

        assert_eq!(
            drain(&mut receiver),
            [
                InvocationEvent::WillInvoke {
                    tool_name: "run_in_terminal".into(),
                    correlation_id: id.clone(),
                },
                InvocationEvent::DidInvoke {
                    tool_name: "run_in_terminal".into(),
                    correlation_id: id,
                },
            ]
        );
    }

    #[tokio::test]
    async fn raw_names_are_canonicalized_for_events() {
        let host = Arc::new(LocalToolHost::new());
        host.register_tool(tool("copilot_runInTerminal"), echo).unwrap();
        let (orchestrator, mut receiver) = orchestrator(host);

        orchestrator
            .invoke(
                "copilot_runInTerminal",
                InvocationOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let events = drain(&mut receiver);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.tool_name() == "run_in_terminal"));
        assert_eq!(events[0].correlation_id(), events[1].correlation_id());
    }

    #[tokio::test]
    async fn host_errors_propagate_verbatim() {
        let host = Arc::new(LocalToolHost::new());
        host.register_tool(tool("copilot_runInTerminal"), failing).unwrap();
        let (orchestrator, mut receiver) = orchestrator(host);

        let err = orchestrator
            .invoke(
                "run_in_terminal",
                InvocationOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, HostError::execution("disk full"));

        let unknown = orchestrator
            .invoke("missing", InvocationOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            unknown,
            HostError::UnknownTool {
                name: "missing".into()
            }
        );
        assert_eq!(drain(&mut receiver).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn global_timeout_resolves_with_explanation() {
        let host = Arc::new(LocalToolHost::new());
        let slot = register_pending(&host, "copilot_runInTerminal");
        let (orchestrator, mut receiver) = orchestrator(host);
        let external = CancellationToken::new();

        let start = Instant::now();
        let output = orchestrator
            .invoke("run_in_terminal", InvocationOptions::default(), &external)
            .await
            .unwrap();

        assert!(start.elapsed() >= INVOCATION_TIMEOUT);
        let text = output.text_content();
        assert!(text.contains("15 minutes"));
        assert!(text.contains("background"));

        let internal = slot.lock().unwrap().clone().unwrap();
        assert!(internal.is_cancelled());
        assert!(!external.is_cancelled());

        let events = drain(&mut receiver);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], InvocationEvent::DidInvoke { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_tools_auto_allow_before_timeout() {
        let host = Arc::new(LocalToolHost::new());
        let slot = register_pending(&host, "vscode_get_confirmation");
        let (orchestrator, _receiver) = orchestrator(host);

        let start = Instant::now();
        let output = orchestrator
            .invoke(
                "get_confirmation",
                InvocationOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= AUTO_ALLOW_TIMEOUT);
        assert!(elapsed < INVOCATION_TIMEOUT);
        assert_eq!(output.text_content(), AUTO_ALLOW_RESPONSE);
        assert!(slot.lock().unwrap().as_ref().unwrap().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn external_cancellation_reaches_the_host() {
        let host = Arc::new(LocalToolHost::new());
        let slot = register_pending(&host, "copilot_runInTerminal");
        let (orchestrator, mut receiver) = orchestrator(host);
        let external = CancellationToken::new();

        let canceller = external.clone();
        let (result, ()) = tokio::join!(
            orchestrator.invoke("run_in_terminal", InvocationOptions::default(), &external),
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                canceller.cancel();
            }
        );

        assert_eq!(result.unwrap_err(), HostError::Cancelled);
        assert!(slot.lock().unwrap().as_ref().unwrap().is_cancelled());
        assert_eq!(drain(&mut receiver).len(), 2);
    }

    #[tokio::test]
    async fn settled_invocations_are_unlinked_from_the_caller_token() {
        let host = Arc::new(LocalToolHost::new());
        let slot: TokenSlot = Arc::default();
        let recorder = Arc::clone(&slot);
        host.register_tool(
            tool("copilot_runInTerminal"),
            move |options: InvocationOptions, token: CancellationToken| {
                *recorder.lock().unwrap() = Some(token.clone());
                echo(options, token)
            },
        )
        .unwrap();
        let (orchestrator, _receiver) = orchestrator(host);
        let external = CancellationToken::new();

        orchestrator
            .invoke("run_in_terminal", InvocationOptions::default(), &external)
            .await
            .unwrap();
        external.cancel();

        let retained = slot.lock().unwrap().clone().unwrap();
        assert!(!retained.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_call_still_emits_did_invoke() {
        let host = Arc::new(LocalToolHost::new());
        register_pending(&host, "copilot_runInTerminal");
        let (orchestrator, mut receiver) = orchestrator(host);

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            orchestrator.invoke(
                "run_in_terminal",
                InvocationOptions::default(),
                &CancellationToken::new(),
            ),
        )
        .await;
        assert!(abandoned.is_err());

        let events = drain(&mut receiver);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], InvocationEvent::WillInvoke { .. }));
        assert!(matches!(events[1], InvocationEvent::DidInvoke { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn settled_invocations_have_no_late_effects() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        async fn counted(
            _options: InvocationOptions,
            token: CancellationToken,
        ) -> HostResult<ToolOutput> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            assert!(!token.is_cancelled());
            Ok(ToolOutput::text("done"))
        }

        let host = Arc::new(LocalToolHost::new());
        host.register_tool(tool("vscode_get_confirmation"), counted)
            .unwrap();
        let (orchestrator, mut receiver) = orchestrator(host);

        let output = orchestrator
            .invoke(
                "get_confirmation",
                InvocationOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(output.text_content(), "done");
        assert_eq!(drain(&mut receiver).len(), 2);

        tokio::time::advance(INVOCATION_TIMEOUT * 2).await;
        tokio::task::yield_now().await;

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    struct StuckHost;

    #[async_trait]
    impl ToolHost for StuckHost {
        fn list_tools(&self) -> Arc<[ToolDescriptor]> {
            Arc::from(Vec::new())
        }

        async fn invoke_tool(
            &self,
            _raw_name: &str,
            _options: InvocationOptions,
            _token: CancellationToken,
        ) -> HostResult<ToolOutput> {
            future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_wins_even_when_the_host_ignores_cancellation() {
        let events = EventBus::new(4);
        let orchestrator = InvocationOrchestrator::new(
            Arc::new(StuckHost),
            Arc::new(NameMapper::identity()),
            events,
        );

        let output = orchestrator
            .invoke("get_confirmation", InvocationOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(output.text_content().contains("15 minutes"));
    }

    #[test]
    fn timeout_message_names_the_duration() {
        assert!(timeout_message(INVOCATION_TIMEOUT).contains("15 minutes"));
        assert!(timeout_message(Duration::from_secs(45)).contains("45 seconds"));
    }
}
