//! Host log sink management

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use webbridge_core::LogLevel;

/// Host-supplied log sink
///
/// Receives the level, the target (module path), and the formatted message.
/// Runs on whatever thread emitted the event, so it must not block.
pub type LogCallback = Arc<dyn Fn(LogLevel, &str, &str) + Send + Sync>;

/// Global log callback manager
static CALLBACK_MANAGER: OnceCell<LogCallbackManager> = OnceCell::new();

/// Holds the log sink and the minimum level forwarded to it
pub struct LogCallbackManager {
    callback: RwLock<Option<LogCallback>>,
    level: AtomicU8,
}

impl LogCallbackManager {
    pub fn new() -> Self {
        Self {
            callback: RwLock::new(None),
            level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Get the global callback manager instance
    pub fn global() -> &'static LogCallbackManager {
        CALLBACK_MANAGER.get_or_init(LogCallbackManager::new)
    }

    pub fn set_callback(&self, callback: Option<LogCallback>) {
        *self.callback.write() = callback;
    }

    pub fn get_callback(&self) -> Option<LogCallback> {
        self.callback.read().clone()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Check if a log level is enabled
    ///
    /// `Off` as the threshold disables everything.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Forward one message to the sink if its level is enabled
    ///
    /// A panicking sink is contained here; the message is lost.
    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        // Clone out so the sink runs without the lock held
        let Some(callback) = self.get_callback() else {
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| callback(level, target, message))).is_err() {
            // Reporting through tracing here could recurse into the sink
            eprintln!("webbridge: log callback panicked, message dropped");
        }
    }
}

impl Default for LogCallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogCallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCallbackManager")
            .field("level", &self.level())
            .field("has_callback", &self.callback.read().is_some())
            .finish()
    }
}
