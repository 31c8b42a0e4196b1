//! Error types for webbridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error type for bridge operations
///
/// None of these ever terminate the host: the runtime logs and drops, or
/// delivers the error to the original caller as an error outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Inbound message could not be deserialized into an envelope
    #[error("parse error: {0}")]
    Parse(String),

    /// The transport endpoint is gone (torn down or never attached)
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A handler failed while processing an inbound call
    #[error("handler failure: {0}")]
    HandlerFailure(String),

    /// Outbound payload could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Bridge is not in a valid state for the requested operation
    #[error("invalid bridge state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// The remote side answered a correlated call with an error outcome
    #[error("remote error {code}: {message}")]
    Remote { code: u32, message: String },

    /// A caller-applied timeout elapsed before the reply arrived
    #[error("call timed out")]
    Timeout,

    /// The pending call was dropped before it resolved
    #[error("call cancelled")]
    Cancelled,

    /// Async runtime error
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns a stable numeric code, carried in error outcomes on the wire
    pub fn error_code(&self) -> u32 {
        match self {
            BridgeError::Parse(_) => 1,
            BridgeError::TransportUnavailable(_) => 2,
            BridgeError::HandlerFailure(_) => 3,
            BridgeError::Serialization(_) => 4,
            BridgeError::Config(_) => 5,
            BridgeError::InvalidState { .. } => 6,
            BridgeError::Remote { code, .. } => *code,
            BridgeError::Timeout => 8,
            BridgeError::Cancelled => 9,
            BridgeError::Runtime(_) => 10,
            BridgeError::Internal(_) => 11,
        }
    }

    /// Message suitable for an error outcome sent to the remote side
    ///
    /// Remote errors pass their original message through untouched.
    pub fn outcome_message(&self) -> String {
        match self {
            BridgeError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            BridgeError::Parse(err.to_string())
        } else {
            BridgeError::Serialization(err.to_string())
        }
    }
}
