//! Handler capability and call context

use crate::{BridgeResult, ReplySink};
use async_trait::async_trait;
use std::future::Future;

/// An inbound call as seen by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Method name, never empty
    pub method: String,
    /// Params in string form (raw for strings, JSON text otherwise)
    pub params: Option<String>,
    /// Callback id of the remote caller, if it expects a reply
    pub callback_id: Option<String>,
}

impl CallContext {
    /// Create a new call context
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
            callback_id: None,
        }
    }

    /// Set params
    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Set callback id
    pub fn with_callback_id(mut self, id: impl Into<String>) -> Self {
        self.callback_id = Some(id.into());
        self
    }

    /// Parse the params string as JSON into a typed value
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> BridgeResult<T> {
        let text = self.params.as_deref().unwrap_or("null");
        Ok(serde_json::from_str(text)?)
    }
}

/// Business logic serving calls from the remote runtime
///
/// A handler answers a correlated call by invoking the sink exactly once.
/// Returning `Err`, or panicking, before the sink was used makes the
/// dispatcher answer with an error outcome on the handler's behalf. Routing
/// by method name is entirely up to the implementation.
///
/// # Example
///
/// ```ignore
/// use webbridge_core::prelude::*;
///
/// struct DeviceHandler;
///
/// #[async_trait::async_trait]
/// impl Handler for DeviceHandler {
///     async fn handle(&self, call: CallContext, sink: ReplySink) -> BridgeResult<()> {
///         match call.method.as_str() {
///             "getDeviceInfo" => {
///                 sink.success(serde_json::json!({"os": "demo"}));
///                 Ok(())
///             }
///             other => Err(BridgeError::HandlerFailure(format!("unknown method {other}"))),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process one inbound call
    async fn handle(&self, call: CallContext, sink: ReplySink) -> BridgeResult<()>;
}

/// Adapter turning an async closure into a [`Handler`]
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(CallContext, ReplySink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BridgeResult<()>> + Send + 'static,
{
    async fn handle(&self, call: CallContext, sink: ReplySink) -> BridgeResult<()> {
        (self.func)(call, sink).await
    }
}
