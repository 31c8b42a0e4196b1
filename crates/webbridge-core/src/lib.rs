//! webbridge-core - Core types for the host/web message bridge
//!
//! This crate provides the foundational types shared by every webbridge crate:
//! - [`Payload`] tagged union carried in the `params` slot of an envelope
//! - [`Handler`] trait for business logic serving inbound calls
//! - [`ReplySink`] and [`Outcome`] for answering correlated calls
//! - [`BridgeState`] for the bridge instance lifecycle
//! - [`BridgeError`] for error handling
//! - [`BridgeConfig`] for bridge configuration

mod config;
mod error;
mod handler;
mod lifecycle;
mod payload;
mod reply;

pub use config::{BridgeConfig, MAX_NOTIFICATION_CAPACITY};
pub use error::{BridgeError, BridgeResult};
pub use handler::{CallContext, FnHandler, Handler};
pub use lifecycle::{BridgeState, StateCell};
pub use payload::Payload;
pub use reply::{Outcome, ReplySink};

/// Log levels for the diagnostic log sink
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }

    /// Parse a case-insensitive level name such as `"debug"`
    ///
    /// Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeError, BridgeResult, BridgeState, CallContext, FnHandler, Handler,
        LogLevel, Outcome, Payload, ReplySink, StateCell,
    };
}
