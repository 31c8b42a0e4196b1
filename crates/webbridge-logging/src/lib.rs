//! webbridge-logging - Diagnostic log sink for bridge events
//!
//! This crate provides:
//! - [`LogCallbackManager`] holding the host's log sink and level filter
//! - [`BridgeLoggingLayer`] tracing layer forwarding events to that sink
//! - [`init_logging`] and friends to install the layer globally

mod callback;
mod layer;

pub use callback::{LogCallback, LogCallbackManager};
pub use layer::{
    BridgeLoggingLayer, init_logging, init_logging_from_config, init_logging_with_level,
};
pub use webbridge_core::LogLevel;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BridgeLoggingLayer, LogCallback, LogCallbackManager, LogLevel, init_logging};
}
