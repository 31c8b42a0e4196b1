//! Codec trait, JSON implementation, and script-literal escaping

use crate::Envelope;
use serde_json::Value;
use thiserror::Error;
use webbridge_core::{BridgeConfig, BridgeError};

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CodecError::Deserialization(err.to_string())
        } else {
            CodecError::Serialization(err.to_string())
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Serialization(msg) => BridgeError::Serialization(msg),
            CodecError::Deserialization(msg) | CodecError::InvalidFormat(msg) => {
                BridgeError::Parse(msg)
            }
        }
    }
}

/// A message as delivered by the transport
///
/// Some platforms hand over structured values, others only strings.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// Text that must be parsed as JSON
    Text(String),
    /// Already-structured value
    Structured(Value),
}

impl From<String> for RawMessage {
    fn from(text: String) -> Self {
        RawMessage::Text(text)
    }
}

impl From<&str> for RawMessage {
    fn from(text: &str) -> Self {
        RawMessage::Text(text.to_string())
    }
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        RawMessage::Structured(value)
    }
}

/// Trait for envelope encoding and decoding
pub trait Codec: Send + Sync {
    /// Encode an envelope to its interchange text
    fn encode(&self, envelope: &Envelope) -> Result<String, CodecError>;

    /// Decode a delivered message into a complete envelope
    ///
    /// Either the whole envelope is returned or an error; never a partial one.
    fn decode(&self, raw: RawMessage) -> Result<Envelope, CodecError>;
}

/// JSON codec implementation using serde_json
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self
    }

    /// Script delivering a host-initiated call to the remote dispatch entry point
    ///
    /// `<object>.<notify_function>(JSON.parse('<escaped envelope>'));`
    pub fn dispatch_script(
        &self,
        config: &BridgeConfig,
        envelope: &Envelope,
    ) -> Result<String, CodecError> {
        let literal = escape_script_literal(&self.encode(envelope)?);
        Ok(format!(
            "{}.{}(JSON.parse('{}'));",
            config.remote_object, config.notify_function, literal
        ))
    }

    /// Script delivering a reply to the remote callback entry point
    ///
    /// `<object>.<callback_function>('<escaped token>', JSON.parse('<escaped envelope>'));`
    pub fn reply_script(
        &self,
        config: &BridgeConfig,
        callback_id: &str,
        envelope: &Envelope,
    ) -> Result<String, CodecError> {
        let literal = escape_script_literal(&self.encode(envelope)?);
        Ok(format!(
            "{}.{}('{}', JSON.parse('{}'));",
            config.remote_object,
            config.callback_function,
            escape_script_literal(callback_id),
            literal
        ))
    }
}

impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<String, CodecError> {
        serde_json::to_string(envelope).map_err(Into::into)
    }

    fn decode(&self, raw: RawMessage) -> Result<Envelope, CodecError> {
        let envelope: Envelope = match raw {
            RawMessage::Text(text) => serde_json::from_str(&text)?,
            // Some webviews post a JSON string rather than the object itself
            RawMessage::Structured(Value::String(text)) => serde_json::from_str(&text)?,
            RawMessage::Structured(value) => serde_json::from_value(value)?,
        };

        if envelope.method.trim().is_empty() {
            return Err(CodecError::InvalidFormat("envelope method is empty".to_string()));
        }

        Ok(envelope)
    }
}

/// Escape `input` for embedding inside a quoted script string literal
///
/// Covers every character that could end the literal or the line it sits on:
/// backslash, both quote characters, line feed, carriage return, and the two
/// Unicode line terminators U+2028/U+2029.
pub fn escape_script_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}
