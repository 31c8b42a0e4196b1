//! Transport collaborator and the bridge's weak binding to it

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use webbridge_core::BridgeError;

/// Errors reported by a transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint is gone (view destroyed, binding released)
    #[error("transport closed")]
    Closed,

    /// The platform refused the script
    #[error("transport rejected script: {0}")]
    Rejected(String),
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        BridgeError::TransportUnavailable(err.to_string())
    }
}

/// Platform mechanism that evaluates scripts in the web runtime
///
/// Inbound messages are not part of this trait: the host integration feeds
/// them to the bridge's inbound entry point as they arrive.
pub trait Transport: Send + Sync {
    /// Deliver a script for evaluation in the remote runtime
    fn send(&self, script: String) -> Result<(), TransportError>;

    /// Release platform resources bound to the bridge
    ///
    /// Called once when the owning bridge is destroyed, before the binding
    /// is dropped.
    fn teardown(&self) {}
}

/// Weak, invalidatable binding from a bridge to its transport
///
/// The bridge never keeps the transport alive. Every use re-checks the
/// binding; a released binding or a transport dropped elsewhere both read as
/// [`TransportError::Closed`].
pub struct TransportHandle {
    slot: RwLock<Option<Weak<dyn Transport>>>,
}

impl TransportHandle {
    /// Bind to a live transport
    pub fn new(transport: &Arc<dyn Transport>) -> Self {
        Self::from_weak(Arc::downgrade(transport))
    }

    /// Bind to a weak transport reference
    pub fn from_weak(transport: Weak<dyn Transport>) -> Self {
        Self {
            slot: RwLock::new(Some(transport)),
        }
    }

    /// Create a handle with no transport bound
    pub fn detached() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Upgrade to the transport if it is still bound and alive
    pub fn get(&self) -> Option<Arc<dyn Transport>> {
        self.slot.read().as_ref().and_then(Weak::upgrade)
    }

    /// Whether a live transport is reachable through this handle
    pub fn is_available(&self) -> bool {
        self.get().is_some()
    }

    /// Send a script through the bound transport
    pub fn send(&self, script: String) -> Result<(), TransportError> {
        // Upgrade under the read lock, send outside it
        let transport = self.get().ok_or(TransportError::Closed)?;
        transport.send(script)
    }

    /// Invalidate the binding, returning the transport if it was still alive
    pub fn release(&self) -> Option<Arc<dyn Transport>> {
        self.slot.write().take().and_then(|weak| weak.upgrade())
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Transport that queues scripts on a channel
///
/// The receiving end is drained by whatever owns the real script engine,
/// typically on the UI thread. After [`Transport::teardown`] every send fails
/// with [`TransportError::Closed`].
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<String>,
    torn_down: AtomicBool,
}

impl ChannelTransport {
    /// Create a transport and the receiver its scripts arrive on
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            sender,
            torn_down: AtomicBool::new(false),
        });
        (transport, receiver)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, script: String) -> Result<(), TransportError> {
        if self.is_torn_down() {
            return Err(TransportError::Closed);
        }
        self.sender.send(script).map_err(|_| TransportError::Closed)
    }

    fn teardown(&self) {
        if !self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("channel transport torn down");
        }
    }
}
