//! Bridge instance lifecycle

use crate::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle states of a bridge instance
///
/// State transitions:
/// ```text
/// Attached → Detached → Destroyed
///     │                    ↑
///     └────────────────────┘
/// ```
///
/// `Detached` is entered when the transport disappears on its own (its host
/// view is already gone). `Destroyed` is terminal and entered only through an
/// explicit destroy by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    /// Transport binding is live
    #[default]
    Attached,
    /// Transport vanished; outbound calls are logged no-ops
    Detached,
    /// Owner destroyed the bridge; every operation is a logged no-op
    Destroyed,
}

impl BridgeState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: BridgeState) -> bool {
        use BridgeState::*;
        matches!(
            (self, target),
            (Attached, Detached) | (Attached, Destroyed) | (Detached, Destroyed)
        )
    }

    /// Check if inbound envelopes are still processed in this state
    ///
    /// A detached bridge still resolves replies that were already in flight.
    pub fn accepts_inbound(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if the bridge is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeState::Destroyed)
    }

    pub fn as_u8(self) -> u8 {
        match self {
            BridgeState::Attached => 0,
            BridgeState::Detached => 1,
            BridgeState::Destroyed => 2,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => BridgeState::Attached,
            1 => BridgeState::Detached,
            _ => BridgeState::Destroyed,
        }
    }
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeState::Attached => write!(f, "Attached"),
            BridgeState::Detached => write!(f, "Detached"),
            BridgeState::Destroyed => write!(f, "Destroyed"),
        }
    }
}

/// Shared, atomically updated lifecycle state of one bridge
#[derive(Debug, Default)]
pub struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    /// Create a cell in the `Attached` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn get(&self) -> BridgeState {
        BridgeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Attempt to transition to a new state
    ///
    /// Concurrent callers racing for the same transition see exactly one
    /// success.
    pub fn transition_to(&self, target: BridgeState) -> BridgeResult<BridgeState> {
        let mut current = self.get();
        loop {
            if !current.can_transition_to(target) {
                return Err(BridgeError::InvalidState {
                    expected: format!("state that can transition to {}", target),
                    actual: current.to_string(),
                });
            }
            match self.state.compare_exchange(
                current.as_u8(),
                target.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = BridgeState::from_u8(actual),
            }
        }
    }
}
