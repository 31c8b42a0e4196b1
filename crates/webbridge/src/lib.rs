//! # webbridge
//!
//! A bidirectional message bridge between a host application and the script
//! runtime embedded in one of its web views.
//!
//! Each side can invoke named methods on the other and optionally receive an
//! asynchronous result. Messages travel as `{method, callbackId, params}`
//! envelopes; a callback token turns the one-way channel into request/response.
//!
//! ## Serving calls from the page
//!
//! ```ignore
//! use webbridge::prelude::*;
//!
//! struct DeviceHandler;
//!
//! #[async_trait]
//! impl Handler for DeviceHandler {
//!     async fn handle(&self, call: CallContext, sink: ReplySink) -> BridgeResult<()> {
//!         match call.method.as_str() {
//!             "getDeviceInfo" => {
//!                 sink.success(serde_json::json!({"os": "demo"}));
//!                 Ok(())
//!             }
//!             other => Err(BridgeError::HandlerFailure(format!("unknown method {other}"))),
//!         }
//!     }
//! }
//!
//! let (transport, mut scripts) = ChannelTransport::new();
//! let transport: Arc<dyn Transport> = transport;
//! let bridge = Bridge::new(BridgeConfig::default(), &transport, Arc::new(DeviceHandler))?;
//!
//! // The web view's message callback feeds the bridge:
//! bridge.on_message(r#"{"method":"getDeviceInfo","callbackId":"cb-1"}"#);
//!
//! // The UI thread evaluates whatever the bridge emits:
//! while let Some(script) = scripts.recv().await {
//!     webview.evaluate_script(&script);
//! }
//! ```
//!
//! ## Calling into the page
//!
//! ```ignore
//! let theme = bridge
//!     .call_with_timeout("currentTheme", Payload::Absent, Duration::from_secs(2))
//!     .await?;
//! bridge.notify("refresh", Payload::Absent);
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`webbridge_core`] - Payloads, handler capability, errors, configuration
//! - [`webbridge_transport`] - Envelope, codec, script escaping, transport binding
//! - [`webbridge_runtime`] - Correlator, dispatcher, invoker, bridge, registry
//! - [`webbridge_logging`] - Diagnostic log sink and tracing layer

// Re-export core types
pub use webbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, BridgeState, CallContext, FnHandler, Handler,
    LogLevel, MAX_NOTIFICATION_CAPACITY, Outcome, Payload, ReplySink,
};

// Re-export transport types
pub use webbridge_transport::{
    ChannelTransport, Codec, Envelope, JsonCodec, RawMessage, Transport, TransportError,
    TransportHandle, escape_script_literal,
};

// Re-export runtime types
pub use webbridge_runtime::{
    Bridge, BridgeRegistry, CallbackCorrelator, Dispatch, PendingReply, Resolution,
};

// Re-export logging
pub use webbridge_logging::{
    BridgeLoggingLayer, LogCallback, LogCallbackManager, init_logging, init_logging_from_config,
    init_logging_with_level,
};

// Re-export common dependencies that handler authors need
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use webbridge::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        Bridge, BridgeConfig, BridgeError, BridgeResult, CallContext, ChannelTransport, FnHandler,
        Handler, Payload, PendingReply, ReplySink, Transport, async_trait,
    };

    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
