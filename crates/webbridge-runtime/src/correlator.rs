//! Callback correlation for outbound calls that expect a reply

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use webbridge_core::{BridgeError, BridgeResult, Outcome, Payload};

/// What happened to a `resolve` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The waiting caller received the outcome
    Delivered,
    /// The record matched but the caller had stopped waiting
    Abandoned,
    /// No outstanding call with this token (already resolved, cancelled, or never issued)
    Unmatched,
}

/// Pending call record: one per outstanding token
struct PendingCall {
    created_at: Instant,
    waiter: oneshot::Sender<Outcome>,
}

/// Outstanding calls plus the flag that stops new ones being registered
#[derive(Default)]
struct PendingCalls {
    closed: bool,
    calls: HashMap<String, PendingCall>,
}

/// Bookkeeping map from callback token to the caller waiting on it
///
/// Tokens come from a per-instance counter and are never reused. The first
/// `resolve` for a token removes its record; every later one finds nothing
/// and is a no-op. All map mutation goes through a single lock, and once
/// [`CallbackCorrelator::close`] has run no record is ever inserted again.
pub struct CallbackCorrelator {
    prefix: String,
    next_token: AtomicU64,
    pending: Mutex<PendingCalls>,
}

impl CallbackCorrelator {
    /// Create a correlator issuing tokens as `<prefix><n>`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_token: AtomicU64::new(0),
            pending: Mutex::new(PendingCalls::default()),
        }
    }

    fn next_token(&self) -> String {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst);
        format!("{}{}", self.prefix, n)
    }

    /// Register a new outstanding call and return the handle that awaits it
    ///
    /// On a closed correlator nothing is registered and the reply resolves
    /// as cancelled.
    pub fn begin_call(&self) -> PendingReply {
        self.try_begin_call().unwrap_or_else(|| self.begin_cancelled())
    }

    /// Register a new outstanding call, or `None` once the correlator is closed
    pub fn try_begin_call(&self) -> Option<PendingReply> {
        let token = self.next_token();
        let (waiter, receiver) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if pending.closed {
                tracing::debug!(token = %token, "correlator closed, call not registered");
                return None;
            }
            pending.calls.insert(
                token.clone(),
                PendingCall {
                    created_at: Instant::now(),
                    waiter,
                },
            );
        }
        tracing::trace!(token = %token, "call registered");
        Some(PendingReply { token, receiver })
    }

    /// Issue a token without registering it; the reply resolves as cancelled
    ///
    /// Used when the bridge can no longer deliver anything.
    pub(crate) fn begin_cancelled(&self) -> PendingReply {
        let token = self.next_token();
        let (_, receiver) = oneshot::channel();
        PendingReply { token, receiver }
    }

    /// Deliver `outcome` to the caller waiting on `token`
    pub fn resolve(&self, token: &str, outcome: Outcome) -> Resolution {
        let record = self.pending.lock().calls.remove(token);
        match record {
            None => {
                tracing::debug!(token = %token, "no outstanding call for token, discarding reply");
                Resolution::Unmatched
            }
            Some(record) => match record.waiter.send(outcome) {
                Ok(()) => {
                    tracing::trace!(
                        token = %token,
                        elapsed = ?record.created_at.elapsed(),
                        "call resolved"
                    );
                    Resolution::Delivered
                }
                Err(_) => {
                    tracing::debug!(token = %token, "caller stopped waiting before reply arrived");
                    Resolution::Abandoned
                }
            },
        }
    }

    /// Whether `token` still awaits a reply
    pub fn is_outstanding(&self, token: &str) -> bool {
        self.pending.lock().calls.contains_key(token)
    }

    /// Drop the record for `token`; its waiter observes `Cancelled`
    ///
    /// A reply arriving later is discarded like any duplicate.
    pub fn cancel(&self, token: &str) -> bool {
        self.pending.lock().calls.remove(token).is_some()
    }

    /// Number of outstanding calls
    pub fn outstanding(&self) -> usize {
        self.pending.lock().calls.len()
    }

    /// Whether [`CallbackCorrelator::close`] has run
    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    /// Tokens registered longer ago than `older_than`
    ///
    /// Building block for caller-side timeout sweeps; nothing expires on its own.
    pub fn stale_tokens(&self, older_than: Duration) -> Vec<String> {
        let now = Instant::now();
        self.pending
            .lock()
            .calls
            .iter()
            .filter(|(_, record)| now.duration_since(record.created_at) >= older_than)
            .map(|(token, _)| token.clone())
            .collect()
    }

    /// Drop every outstanding call, returning how many there were
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().calls.drain().collect();
        drained.len()
    }

    /// Drop every outstanding call and refuse new ones
    ///
    /// Returns how many calls were dropped. Their waiters, and every call
    /// begun afterwards, observe `Cancelled`.
    pub fn close(&self) -> usize {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock();
            pending.closed = true;
            pending.calls.drain().collect()
        };
        drained.len()
    }
}

/// Handle to an outstanding call, resolved when the matching reply arrives
#[derive(Debug)]
pub struct PendingReply {
    token: String,
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingReply {
    /// The callback token sent with the call
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Wait for the raw outcome
    ///
    /// Returns `Cancelled` if the record was dropped without a reply.
    pub async fn outcome(self) -> BridgeResult<Outcome> {
        self.receiver.await.map_err(|_| BridgeError::Cancelled)
    }

    /// Wait for the reply, mapping an error outcome to `BridgeError::Remote`
    pub async fn wait(self) -> BridgeResult<Payload> {
        self.outcome().await?.into_result()
    }
}
