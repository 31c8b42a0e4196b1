//! Bridge configuration types

use crate::{BridgeError, BridgeResult, LogLevel};
use serde::{Deserialize, Serialize};

/// Largest accepted `notification_capacity`
pub const MAX_NOTIFICATION_CAPACITY: usize = 1 << 16;

/// Configuration for one bridge instance
///
/// The function names are spliced into evaluated script unescaped, so
/// [`BridgeConfig::validate`] only accepts plain identifiers for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name of the channel the remote side uses to reach the host
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Global object that holds the remote entry points (e.g. `window`)
    #[serde(default = "default_remote_object")]
    pub remote_object: String,

    /// Remote entry point for callback-correlated deliveries
    ///
    /// Also the reserved method name for replies in both directions.
    #[serde(default = "default_callback_function")]
    pub callback_function: String,

    /// Remote entry point for one-way deliveries
    ///
    /// Also the reserved method name for inbound one-way notifications.
    #[serde(default = "default_notify_function")]
    pub notify_function: String,

    /// Prefix for callback tokens issued by this bridge
    #[serde(default = "default_callback_id_prefix")]
    pub callback_id_prefix: String,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Buffer size of the inbound notification broadcast channel
    ///
    /// Must be in `1..=MAX_NOTIFICATION_CAPACITY`.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_channel_name() -> String {
    "NativeBridge".to_string()
}

fn default_remote_object() -> String {
    "window".to_string()
}

fn default_callback_function() -> String {
    "onNativeCallback".to_string()
}

fn default_notify_function() -> String {
    "onNativeNotify".to_string()
}

fn default_callback_id_prefix() -> String {
    "cb_".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_notification_capacity() -> usize {
    64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            remote_object: default_remote_object(),
            callback_function: default_callback_function(),
            notify_function: default_notify_function(),
            callback_id_prefix: default_callback_id_prefix(),
            log_level: default_log_level(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    ///
    /// Empty input yields the defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Set the channel name
    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }

    /// Set the callback token prefix
    pub fn with_callback_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.callback_id_prefix = prefix.into();
        self
    }

    /// Set the log level name
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }

    /// Whether `method` is one of the two reserved reply-path names
    pub fn is_reserved_method(&self, method: &str) -> bool {
        method == self.callback_function || method == self.notify_function
    }

    /// Check the configuration before a bridge is built from it
    pub fn validate(&self) -> BridgeResult<()> {
        for (field, value) in [
            ("channel_name", &self.channel_name),
            ("remote_object", &self.remote_object),
            ("callback_function", &self.callback_function),
            ("notify_function", &self.notify_function),
        ] {
            if !is_script_identifier(value) {
                return Err(BridgeError::Config(format!(
                    "{field} must be a plain identifier, got {value:?}"
                )));
            }
        }

        if self.callback_function == self.notify_function {
            return Err(BridgeError::Config(
                "callback_function and notify_function must differ".to_string(),
            ));
        }

        if self.notification_capacity == 0 {
            return Err(BridgeError::Config(
                "notification_capacity must be greater than zero".to_string(),
            ));
        }

        if self.notification_capacity > MAX_NOTIFICATION_CAPACITY {
            return Err(BridgeError::Config(format!(
                "notification_capacity must be at most {MAX_NOTIFICATION_CAPACITY}, got {}",
                self.notification_capacity
            )));
        }

        Ok(())
    }
}

fn is_script_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}


#[cfg(test)]
#[path = "config/config_parameterized_tests.rs"]
mod config_parameterized_tests;
