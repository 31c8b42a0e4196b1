//! Tracing layer that forwards to the host log sink

use crate::callback::LogCallbackManager;
use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use webbridge_core::{BridgeConfig, LogLevel};

/// Tracing layer that forwards events to a [`LogCallbackManager`]
///
/// Structured fields are appended to the message as `key=value` pairs, so
/// `warn!(method = %m, "transport unavailable")` reaches the sink as
/// `transport unavailable method=refresh`.
pub struct BridgeLoggingLayer {
    manager: &'static LogCallbackManager,
}

impl BridgeLoggingLayer {
    /// Create a layer using the global callback manager
    pub fn new() -> Self {
        Self {
            manager: LogCallbackManager::global(),
        }
    }

    /// Create a layer with a specific callback manager
    pub fn with_manager(manager: &'static LogCallbackManager) -> Self {
        Self { manager }
    }

    fn convert_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl Default for BridgeLoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for BridgeLoggingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::convert_level(metadata.level());

        if !self.manager.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.manager.log(level, metadata.target(), &visitor.finish());
    }

    // The level can change at runtime, so callsite interest must not be cached
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.manager.is_enabled(Self::convert_level(metadata.level()))
    }
}

/// Collects the message and the remaining fields of an event
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {}={}", name, value);
    }

    fn finish(self) -> String {
        let mut line = self.message;
        line.push_str(&self.fields);
        if line.starts_with(' ') {
            line.remove(0);
        }
        line
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }
}

/// Install the forwarding layer as the global subscriber
///
/// Returns `false` if a global subscriber was already set; the manager's
/// callback and level can still be changed afterwards.
pub fn init_logging() -> bool {
    use tracing_subscriber::prelude::*;

    let subscriber = tracing_subscriber::registry().with(BridgeLoggingLayer::new());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Set the global level, then install the layer
pub fn init_logging_with_level(level: LogLevel) -> bool {
    LogCallbackManager::global().set_level(level);
    init_logging()
}

/// Install the layer at the level named by `config.log_level`
pub fn init_logging_from_config(config: &BridgeConfig) -> bool {
    init_logging_with_level(config.log_level())
}
