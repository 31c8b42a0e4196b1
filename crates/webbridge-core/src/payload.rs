//! Payload carried in the `params` slot of an envelope

use crate::BridgeResult;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Arbitrary payload exchanged between the runtimes
///
/// The bridge never looks inside a payload beyond what serialization needs.
/// `Opaque` holds the human-readable rendering of a value that had no
/// interchange-format representation; it travels as a plain string and is
/// the one lossy path through the serializer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Payload {
    /// No payload (`null` on the wire)
    #[default]
    Absent,
    /// Boolean, number, or string
    ///
    /// Other JSON values built directly into this variant are not canonical;
    /// [`Payload::normalize`] moves them to the matching variant.
    Primitive(Value),
    /// Ordered sequence
    Sequence(Vec<Value>),
    /// Keyed mapping
    Mapping(Map<String, Value>),
    /// Lossy string rendering of an unrepresentable value
    Opaque(String),
}

impl Payload {
    /// Convenience constructor for a string primitive
    pub fn text(value: impl Into<String>) -> Self {
        Payload::Primitive(Value::String(value.into()))
    }

    /// Encode a serializable value, failing if it has no JSON representation
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> BridgeResult<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Encode a value, falling back to its `Debug` rendering
    ///
    /// Values that serialize cleanly are encoded structurally. Anything else
    /// (maps with composite keys, failing `Serialize` impls) becomes
    /// [`Payload::Opaque`]; the original structure is not recoverable.
    pub fn coerce<T: Serialize + std::fmt::Debug + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => v.into(),
            Err(err) => {
                tracing::debug!("payload not representable as JSON ({}), coercing to string", err);
                Payload::Opaque(format!("{value:?}"))
            }
        }
    }

    /// Canonical form: a `Primitive` holding null, an array, or an object
    /// becomes `Absent`, `Sequence`, or `Mapping`
    pub fn normalize(self) -> Self {
        match self {
            Payload::Primitive(value) => value.into(),
            other => other,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    /// Whether this payload came from the lossy string fallback
    pub fn is_lossy(&self) -> bool {
        matches!(self, Payload::Opaque(_))
    }

    /// Borrowing conversion to a JSON value
    pub fn to_value(&self) -> Value {
        self.clone().into()
    }

    /// String form handed to handlers
    ///
    /// Strings pass through raw, structured values become compact JSON text,
    /// and an absent payload stays absent.
    pub fn to_param_string(&self) -> Option<String> {
        match self {
            Payload::Absent => None,
            Payload::Primitive(Value::String(s)) | Payload::Opaque(s) => Some(s.clone()),
            Payload::Primitive(v) => Some(v.to_string()),
            Payload::Sequence(items) => Some(Value::Array(items.clone()).to_string()),
            Payload::Mapping(map) => Some(Value::Object(map.clone()).to_string()),
        }
    }

    /// Deserialize the payload into a typed value
    pub fn deserialize_as<T: DeserializeOwned>(&self) -> BridgeResult<T> {
        Ok(T::deserialize(self.to_value())?)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Absent,
            Value::Array(items) => Payload::Sequence(items),
            Value::Object(map) => Payload::Mapping(map),
            primitive => Payload::Primitive(primitive),
        }
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Absent => Value::Null,
            Payload::Primitive(v) => v,
            Payload::Sequence(items) => Value::Array(items),
            Payload::Mapping(map) => Value::Object(map),
            Payload::Opaque(s) => Value::String(s),
        }
    }
}
