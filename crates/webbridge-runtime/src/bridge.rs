//! One bridge instance per (host runtime, remote runtime) pair

use crate::correlator::{CallbackCorrelator, PendingReply};
use crate::dispatcher::{Dispatch, InboundDispatcher};
use crate::invoker::OutboundInvoker;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use webbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, BridgeState, Handler, Payload, StateCell,
};
use webbridge_transport::{RawMessage, Transport, TransportHandle};

/// A bridge bound to one transport and one handler
///
/// The bridge holds only a weak reference to its transport. Dropping the
/// bridge destroys it.
///
/// # Example
///
/// ```ignore
/// let (transport, scripts) = ChannelTransport::new();
/// let transport: Arc<dyn Transport> = transport;
/// let bridge = Bridge::new(BridgeConfig::default(), &transport, Arc::new(MyHandler))?;
///
/// // Host integration feeds messages posted by the page:
/// bridge.on_message(r#"{"method":"getDeviceInfo","callbackId":"cb-1"}"#);
///
/// // Host-initiated call awaiting the page's answer:
/// let user = bridge.request("currentUser", Payload::Absent).wait().await?;
/// ```
pub struct Bridge {
    config: Arc<BridgeConfig>,
    state: Arc<StateCell>,
    correlator: Arc<CallbackCorrelator>,
    invoker: Arc<OutboundInvoker>,
    dispatcher: InboundDispatcher,
}

impl Bridge {
    /// Create a bridge spawning handler tasks on the current tokio runtime
    ///
    /// Fails with `Runtime` when called outside a runtime context.
    pub fn new(
        config: BridgeConfig,
        transport: &Arc<dyn Transport>,
        handler: Arc<dyn Handler>,
    ) -> BridgeResult<Self> {
        let runtime = Handle::try_current().map_err(|e| BridgeError::Runtime(e.to_string()))?;
        Self::with_runtime(config, transport, handler, runtime)
    }

    /// Create a bridge spawning handler tasks on `runtime`
    pub fn with_runtime(
        config: BridgeConfig,
        transport: &Arc<dyn Transport>,
        handler: Arc<dyn Handler>,
        runtime: Handle,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let state = Arc::new(StateCell::new());
        let correlator = Arc::new(CallbackCorrelator::new(config.callback_id_prefix.clone()));
        let invoker = Arc::new(OutboundInvoker::new(
            config.clone(),
            TransportHandle::new(transport),
            correlator.clone(),
            state.clone(),
        ));
        let dispatcher = InboundDispatcher::new(
            config.clone(),
            state.clone(),
            correlator.clone(),
            invoker.clone(),
            handler,
            runtime,
        );

        tracing::info!(channel = %config.channel_name, "bridge created");

        Ok(Self {
            config,
            state,
            correlator,
            invoker,
            dispatcher,
        })
    }

    /// Inbound entry point: feed every message the remote side posts
    pub fn on_message(&self, raw: impl Into<RawMessage>) -> Dispatch {
        self.dispatcher.on_envelope(raw)
    }

    /// Invoke `method` remotely, optionally awaiting a reply
    pub fn call(
        &self,
        method: &str,
        params: impl Into<Payload>,
        expects_reply: bool,
    ) -> Option<PendingReply> {
        self.invoker.call(method, params, expects_reply)
    }

    /// Invoke `method` remotely and return the handle awaiting its reply
    pub fn request(&self, method: &str, params: impl Into<Payload>) -> PendingReply {
        self.invoker.request(method, params)
    }

    /// Invoke `method` remotely without expecting a reply
    pub fn notify(&self, method: &str, params: impl Into<Payload>) {
        self.invoker.notify(method, params)
    }

    /// Invoke `method` and wait at most `timeout` for the reply
    ///
    /// On expiry the token is cancelled, so a reply arriving later is
    /// discarded like any duplicate.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: impl Into<Payload>,
        timeout: Duration,
    ) -> BridgeResult<Payload> {
        let pending = self.request(method, params);
        let token = pending.token().to_string();

        match tokio::time::timeout(timeout, pending.wait()).await {
            Ok(result) => result,
            Err(_) => {
                self.correlator.cancel(&token);
                tracing::debug!(method = %method, token = %token, ?timeout, "call timed out");
                Err(BridgeError::Timeout)
            }
        }
    }

    /// Receive one-way notifications posted by the remote side
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Payload> {
        self.dispatcher.subscribe()
    }

    pub fn is_outstanding(&self, token: &str) -> bool {
        self.correlator.is_outstanding(token)
    }

    pub fn outstanding_calls(&self) -> usize {
        self.correlator.outstanding()
    }

    /// Correlator, for diagnostics and caller-side timeout sweeps
    pub fn correlator(&self) -> &CallbackCorrelator {
        &self.correlator
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn channel_name(&self) -> &str {
        &self.config.channel_name
    }

    /// Tear the bridge down
    ///
    /// Releases the transport binding and tears the transport down (once),
    /// then drops every outstanding call so their waiters see `Cancelled`.
    /// Later calls, and every operation afterwards, are logged no-ops.
    pub fn destroy(&self) {
        let previous = match self.state.transition_to(BridgeState::Destroyed) {
            Ok(previous) => previous,
            Err(_) => {
                tracing::debug!(channel = %self.config.channel_name, "bridge already destroyed");
                return;
            }
        };

        if let Some(transport) = self.invoker.transport().release() {
            transport.teardown();
        }
        let dropped = self.correlator.close();

        tracing::info!(
            channel = %self.config.channel_name,
            previous = %previous,
            dropped_calls = dropped,
            "bridge destroyed"
        );
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("channel", &self.config.channel_name)
            .field("state", &self.state.get())
            .field("outstanding", &self.correlator.outstanding())
            .finish()
    }
}
