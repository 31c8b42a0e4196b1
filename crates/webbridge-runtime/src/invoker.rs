//! Host-to-remote delivery of calls and replies

use crate::correlator::{CallbackCorrelator, PendingReply};
use std::sync::Arc;
use webbridge_core::{BridgeConfig, BridgeResult, BridgeState, Outcome, Payload, StateCell};
use webbridge_transport::{Envelope, JsonCodec, TransportError, TransportHandle};

/// Builds envelopes, turns them into remote scripts, and hands them to the transport
///
/// Delivery failures never reach the caller: an unavailable transport is an
/// expected condition during teardown and is only logged.
pub struct OutboundInvoker {
    config: Arc<BridgeConfig>,
    codec: JsonCodec,
    transport: TransportHandle,
    correlator: Arc<CallbackCorrelator>,
    state: Arc<StateCell>,
}

impl OutboundInvoker {
    pub fn new(
        config: Arc<BridgeConfig>,
        transport: TransportHandle,
        correlator: Arc<CallbackCorrelator>,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            transport,
            correlator,
            state,
        }
    }

    /// Invoke `method` in the remote runtime
    ///
    /// With `expects_reply`, a token is registered before sending and the
    /// returned [`PendingReply`] resolves when the remote answers.
    pub fn call(
        &self,
        method: &str,
        params: impl Into<Payload>,
        expects_reply: bool,
    ) -> Option<PendingReply> {
        if expects_reply {
            Some(self.request(method, params))
        } else {
            self.notify(method, params);
            None
        }
    }

    /// Invoke `method` and return the handle awaiting its reply
    ///
    /// If the transport turns out to be gone the call stays outstanding;
    /// bound the wait with a timeout if that matters. On a destroyed bridge
    /// nothing is sent and the reply resolves as cancelled.
    pub fn request(&self, method: &str, params: impl Into<Payload>) -> PendingReply {
        if self.state.get().is_terminal() {
            tracing::debug!(method = %method, "bridge destroyed, dropping outbound call");
            return self.correlator.begin_cancelled();
        }

        // Checked again under the correlator lock: destroy may have run since
        let Some(reply) = self.correlator.try_begin_call() else {
            tracing::debug!(method = %method, "bridge destroyed, dropping outbound call");
            return self.correlator.begin_cancelled();
        };
        if !self.send_call(method, params.into(), Some(reply.token())) {
            self.correlator.cancel(reply.token());
        }
        reply
    }

    /// Invoke `method` without expecting a reply
    pub fn notify(&self, method: &str, params: impl Into<Payload>) {
        if self.state.get().is_terminal() {
            tracing::debug!(method = %method, "bridge destroyed, dropping outbound call");
            return;
        }
        self.send_call(method, params.into(), None);
    }

    /// Send `outcome` back to the remote caller waiting on `callback_id`
    pub fn reply(&self, callback_id: &str, outcome: Outcome) -> BridgeResult<()> {
        if self.state.get().is_terminal() {
            tracing::debug!(callback_id = %callback_id, "bridge destroyed, dropping reply");
            return Ok(());
        }

        let envelope = Envelope::reply(self.config.callback_function.as_str(), outcome);
        let script = self
            .codec
            .reply_script(&self.config, callback_id, &envelope)?;
        self.deliver(&self.config.callback_function, script);
        Ok(())
    }

    /// The weak transport binding
    pub fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// Returns `false` only if the envelope could not be encoded
    fn send_call(&self, method: &str, params: Payload, callback_id: Option<&str>) -> bool {
        let mut envelope = Envelope::new(method, params);
        if let Some(id) = callback_id {
            envelope = envelope.with_callback_id(id);
        }

        match self.codec.dispatch_script(&self.config, &envelope) {
            Ok(script) => {
                self.deliver(method, script);
                true
            }
            Err(e) => {
                tracing::error!(method = %method, error = %e, "failed to encode outbound call");
                false
            }
        }
    }

    fn deliver(&self, method: &str, script: String) {
        match self.transport.send(script) {
            Ok(()) => tracing::trace!(method = %method, "script delivered"),
            Err(TransportError::Closed) => {
                tracing::warn!(method = %method, "transport unavailable, outbound message dropped");
                if self.state.get() == BridgeState::Attached
                    && self.state.transition_to(BridgeState::Detached).is_ok()
                {
                    tracing::info!("bridge detached: transport is gone");
                }
            }
            Err(e) => {
                tracing::warn!(method = %method, error = %e, "transport refused outbound message");
            }
        }
    }
}

impl std::fmt::Debug for OutboundInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundInvoker")
            .field("transport", &self.transport)
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "invoker/invoker_tests.rs"]
mod invoker_tests;
