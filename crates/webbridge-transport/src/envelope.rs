//! Message envelope exchanged between the host and the web runtime

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use webbridge_core::{Outcome, Payload};

/// Envelope wrapping every message in both directions
///
/// Wire shape: `{"method": string, "callbackId": string | null, "params": any}`.
/// All three fields are always written; `callbackId` and `params` may be
/// missing on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Operation being invoked, or the reserved reply method
    pub method: String,

    /// Correlation token; absent for one-way calls
    #[serde(
        rename = "callbackId",
        default,
        deserialize_with = "deserialize_callback_id"
    )]
    pub callback_id: Option<String>,

    /// Opaque payload
    #[serde(default)]
    pub params: Payload,
}

impl Envelope {
    /// Create a one-way envelope
    pub fn new(method: impl Into<String>, params: impl Into<Payload>) -> Self {
        Self {
            method: method.into(),
            callback_id: None,
            params: params.into().normalize(),
        }
    }

    /// Set the callback id
    pub fn with_callback_id(mut self, id: impl Into<String>) -> Self {
        self.callback_id = Some(id.into());
        self
    }

    /// Create the reply envelope carrying `outcome` on the reserved reply method
    ///
    /// The token itself is not part of the envelope; it travels as the first
    /// argument of the remote callback entry point.
    pub fn reply(reply_method: impl Into<String>, outcome: Outcome) -> Self {
        Self::new(reply_method, outcome.into_params())
    }

    /// Whether the sender expects no reply
    pub fn is_one_way(&self) -> bool {
        self.callback_id.is_none()
    }
}

/// Accept a string, a number, or null; an empty string counts as absent
fn deserialize_callback_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "callbackId must be a string or number, got {other}"
        ))),
    }
}
