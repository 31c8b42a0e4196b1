//! Explicit registry of live bridges, owned by the host integration layer

use crate::bridge::Bridge;
use crate::dispatcher::Dispatch;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use webbridge_core::{BridgeError, BridgeResult};
use webbridge_transport::RawMessage;

/// Bridges keyed by instance id, searchable by channel name
///
/// Channel names are unique among registered bridges. There is no global
/// instance: whoever wires views to bridges owns the registry.
pub struct BridgeRegistry {
    bridges: DashMap<u64, Arc<Bridge>>,
    channels: DashMap<String, u64>,
    next_id: AtomicU64,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self {
            bridges: DashMap::new(),
            channels: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a bridge under its channel name
    ///
    /// Fails with `Config` if another bridge already holds the channel.
    pub fn register(&self, bridge: Arc<Bridge>) -> BridgeResult<u64> {
        let channel = bridge.channel_name().to_string();
        match self.channels.entry(channel) {
            Entry::Occupied(existing) => Err(BridgeError::Config(format!(
                "channel {} already registered as bridge {}",
                existing.key(),
                existing.get()
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.bridges.insert(id, bridge);
                tracing::debug!(id, channel = %slot.key(), "bridge registered");
                slot.insert(id);
                Ok(id)
            }
        }
    }

    pub fn get(&self, id: u64) -> Option<Arc<Bridge>> {
        self.bridges.get(&id).map(|r| r.clone())
    }

    pub fn find_by_channel(&self, channel: &str) -> Option<Arc<Bridge>> {
        let id = *self.channels.get(channel)?;
        self.get(id)
    }

    /// Unregister and destroy a bridge
    pub fn remove(&self, id: u64) -> Option<Arc<Bridge>> {
        let (_, bridge) = self.bridges.remove(&id)?;
        self.channels
            .remove_if(bridge.channel_name(), |_, registered| *registered == id);
        bridge.destroy();
        Some(bridge)
    }

    /// Route an inbound message to bridge `id`
    ///
    /// Returns `None` when no such bridge is registered.
    pub fn deliver(&self, id: u64, raw: impl Into<RawMessage>) -> Option<Dispatch> {
        let bridge = self.get(id);
        match bridge {
            Some(bridge) => Some(bridge.on_message(raw)),
            None => {
                tracing::debug!(id, "message for unknown bridge dropped");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    /// Destroy and unregister every bridge, returning how many there were
    pub fn destroy_all(&self) -> usize {
        let ids: Vec<u64> = self.bridges.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter_map(|id| self.remove(id)).count()
    }
}

impl Default for BridgeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
