//! Inbound envelope routing

use crate::correlator::{CallbackCorrelator, Resolution};
use crate::invoker::OutboundInvoker;
use std::any::Any;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use webbridge_core::{
    BridgeConfig, BridgeError, CallContext, Handler, Outcome, Payload, ReplySink, StateCell,
};
use webbridge_transport::{Codec, Envelope, JsonCodec, RawMessage};

/// What the dispatcher did with one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Malformed, missing a required field, or the bridge is destroyed
    Dropped,
    /// A reply for one of our outbound calls
    Resolved(Resolution),
    /// A one-way notification, broadcast to subscribers
    Notified,
    /// Forwarded to the handler, which runs on its own task
    Handled,
}

/// Routes inbound envelopes to the correlator, subscribers, or the handler
///
/// Never waits for the handler: each call is spawned onto the runtime and a
/// supervising task turns handler errors and panics into error outcomes.
/// Errors returned by the handler keep their own code; panics become
/// `HandlerFailure`.
pub struct InboundDispatcher {
    config: Arc<BridgeConfig>,
    codec: JsonCodec,
    state: Arc<StateCell>,
    correlator: Arc<CallbackCorrelator>,
    invoker: Arc<OutboundInvoker>,
    handler: Arc<dyn Handler>,
    notifications: broadcast::Sender<Payload>,
    runtime: Handle,
}

impl InboundDispatcher {
    pub fn new(
        config: Arc<BridgeConfig>,
        state: Arc<StateCell>,
        correlator: Arc<CallbackCorrelator>,
        invoker: Arc<OutboundInvoker>,
        handler: Arc<dyn Handler>,
        runtime: Handle,
    ) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            config,
            codec: JsonCodec::new(),
            state,
            correlator,
            invoker,
            handler,
            notifications,
            runtime,
        }
    }

    /// Subscribe to one-way notifications sent by the remote side
    pub fn subscribe(&self) -> broadcast::Receiver<Payload> {
        self.notifications.subscribe()
    }

    /// Process one message delivered by the transport
    pub fn on_envelope(&self, raw: impl Into<RawMessage>) -> Dispatch {
        let state = self.state.get();
        if !state.accepts_inbound() {
            tracing::debug!(state = %state, "bridge not accepting inbound messages, dropping");
            return Dispatch::Dropped;
        }

        let envelope = match self.codec.decode(raw.into()) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed inbound message");
                return Dispatch::Dropped;
            }
        };

        if self.config.is_reserved_method(&envelope.method) {
            return self.on_reserved(envelope);
        }

        let mut call = CallContext::new(envelope.method);
        if let Some(params) = envelope.params.to_param_string() {
            call = call.with_params(params);
        }
        let sink = match envelope.callback_id {
            Some(callback_id) => {
                call = call.with_callback_id(callback_id.clone());
                let invoker = self.invoker.clone();
                ReplySink::new(callback_id, move |id: &str, outcome: Outcome| {
                    if let Err(e) = invoker.reply(id, outcome) {
                        tracing::error!(callback_id = %id, error = %e, "failed to send reply");
                    }
                })
            }
            None => ReplySink::noop(),
        };

        self.spawn_handler(call, sink);
        Dispatch::Handled
    }

    /// Reply or notification addressed to one of the reserved method names
    fn on_reserved(&self, envelope: Envelope) -> Dispatch {
        if envelope.method == self.config.callback_function {
            let Some(token) = envelope.callback_id else {
                tracing::warn!("reply envelope without callbackId, dropping");
                return Dispatch::Dropped;
            };
            let outcome = Outcome::from_params(envelope.params);
            return Dispatch::Resolved(self.correlator.resolve(&token, outcome));
        }

        // No subscribers is not an error
        let receivers = self.notifications.send(envelope.params).unwrap_or(0);
        tracing::trace!(receivers, "notification broadcast");
        Dispatch::Notified
    }

    fn spawn_handler(&self, call: CallContext, sink: ReplySink) {
        let handler = self.handler.clone();
        let method = call.method.clone();
        let task_sink = sink.clone();
        let task = self
            .runtime
            .spawn(async move { handler.handle(call, task_sink).await });

        self.runtime.spawn(async move {
            let failure = match task.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(join_err) if join_err.is_panic() => Some(BridgeError::HandlerFailure(
                    panic_to_string(&*join_err.into_panic()),
                )),
                Err(_) => Some(BridgeError::HandlerFailure(
                    "handler task was cancelled".to_string(),
                )),
            };

            match failure {
                Some(err) if sink.expects_reply() => {
                    tracing::error!(method = %method, error = %err, "handler failed");
                    if !sink.fail(&err) {
                        tracing::debug!(method = %method, "handler had already replied");
                    }
                }
                Some(err) => {
                    tracing::error!(method = %method, error = %err, "one-way handler failed");
                }
                None if sink.expects_reply() && !sink.is_resolved() => {
                    tracing::warn!(
                        method = %method,
                        callback_id = ?sink.callback_id(),
                        "handler returned without replying to a correlated call"
                    );
                }
                None => {}
            }
        });
    }
}

impl std::fmt::Debug for InboundDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundDispatcher")
            .field("state", &self.state.get())
            .field("subscribers", &self.notifications.receiver_count())
            .finish()
    }
}

/// Convert a panic payload to a human-readable string
fn panic_to_string(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked with unknown payload".to_string()
    }
}
