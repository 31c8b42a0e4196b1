//! Reply outcomes and the sink handlers answer through

use crate::{BridgeError, BridgeResult, Payload};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a correlated call, as carried back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Call completed; payload is the result
    Success(Payload),
    /// Call failed
    Error { code: u32, message: String },
}

impl Outcome {
    /// Create a success outcome
    pub fn success(payload: impl Into<Payload>) -> Self {
        Outcome::Success(payload.into().normalize())
    }

    /// Create an error outcome
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Outcome::Error {
            code,
            message: message.into(),
        }
    }

    /// Create an error outcome from a bridge error
    pub fn from_error(err: &BridgeError) -> Self {
        Self::error(err.error_code(), err.outcome_message())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Wire form placed in the `params` of a reply envelope
    ///
    /// Errors are wrapped as `{"error": {"code": n, "message": s}}`.
    pub fn into_params(self) -> Payload {
        match self {
            Outcome::Success(payload) => payload,
            Outcome::Error { code, message } => {
                let mut detail = Map::new();
                detail.insert("code".to_string(), Value::from(code));
                detail.insert("message".to_string(), Value::String(message));
                let mut wrapper = Map::new();
                wrapper.insert("error".to_string(), Value::Object(detail));
                Payload::Mapping(wrapper)
            }
        }
    }

    /// Read an outcome back from reply-envelope params
    ///
    /// Only a mapping whose sole key is `error` holding an object with a
    /// string `message` is treated as an error; everything else is a success.
    pub fn from_params(params: Payload) -> Self {
        if let Payload::Mapping(map) = &params
            && map.len() == 1
            && let Some(Value::Object(detail)) = map.get("error")
            && let Some(Value::String(message)) = detail.get("message")
        {
            let code = detail
                .get("code")
                .and_then(Value::as_u64)
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(11); // Internal
            return Outcome::error(code, message.clone());
        }
        Outcome::Success(params)
    }

    /// Convert into the caller-facing result
    pub fn into_result(self) -> BridgeResult<Payload> {
        match self {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Error { code, message } => Err(BridgeError::Remote { code, message }),
        }
    }
}

type DeliverFn = dyn Fn(&str, Outcome) + Send + Sync;

struct SinkInner {
    callback_id: Option<String>,
    resolved: AtomicBool,
    deliver: Option<Box<DeliverFn>>,
}

/// One-shot reply channel handed to a handler with each inbound call
///
/// Clones share state: across all clones, only the first `success`/`error`
/// delivers anything. A sink without a callback id belongs to a one-way call
/// and drops whatever it is given.
#[derive(Clone)]
pub struct ReplySink {
    inner: Arc<SinkInner>,
}

impl ReplySink {
    /// Create a sink bound to `callback_id`
    ///
    /// `deliver` is invoked at most once, with the callback id and outcome.
    pub fn new(
        callback_id: impl Into<String>,
        deliver: impl Fn(&str, Outcome) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                callback_id: Some(callback_id.into()),
                resolved: AtomicBool::new(false),
                deliver: Some(Box::new(deliver)),
            }),
        }
    }

    /// Create a sink for a one-way call
    pub fn noop() -> Self {
        Self {
            inner: Arc::new(SinkInner {
                callback_id: None,
                resolved: AtomicBool::new(false),
                deliver: None,
            }),
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        self.inner.callback_id.as_deref()
    }

    /// Whether the caller is waiting for a reply
    pub fn expects_reply(&self) -> bool {
        self.inner.deliver.is_some()
    }

    /// Whether an outcome has already been delivered (or discarded)
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.load(Ordering::SeqCst)
    }

    /// Reply with a success payload
    pub fn success(&self, payload: impl Into<Payload>) -> bool {
        self.resolve(Outcome::success(payload))
    }

    /// Reply with any serializable value, see [`Payload::coerce`]
    pub fn success_typed<T: Serialize + std::fmt::Debug + ?Sized>(&self, value: &T) -> bool {
        self.resolve(Outcome::Success(Payload::coerce(value)))
    }

    /// Reply with an error outcome
    pub fn error(&self, code: u32, message: impl Into<String>) -> bool {
        self.resolve(Outcome::error(code, message))
    }

    /// Reply with an error outcome built from a bridge error
    pub fn fail(&self, err: &BridgeError) -> bool {
        self.resolve(Outcome::from_error(err))
    }

    /// Deliver `outcome` if nothing was delivered yet
    ///
    /// Returns `true` only for the call that actually delivered.
    pub fn resolve(&self, outcome: Outcome) -> bool {
        if self.inner.resolved.swap(true, Ordering::SeqCst) {
            tracing::debug!(
                callback_id = ?self.inner.callback_id,
                "reply already sent, discarding"
            );
            return false;
        }

        match (&self.inner.deliver, &self.inner.callback_id) {
            (Some(deliver), Some(callback_id)) => {
                deliver(callback_id, outcome);
                true
            }
            _ => {
                tracing::debug!("one-way call has no reply channel, discarding outcome");
                false
            }
        }
    }
}

impl std::fmt::Debug for ReplySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplySink")
            .field("callback_id", &self.inner.callback_id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
