//! webbridge-runtime - Bridge instances and message correlation
//!
//! This crate provides:
//! - [`CallbackCorrelator`] turning one-way messages into request/response pairs
//! - [`OutboundInvoker`] for host-to-remote calls and replies
//! - [`InboundDispatcher`] routing remote messages to replies, subscribers, or the handler
//! - [`Bridge`] tying one transport and one handler together
//! - [`BridgeRegistry`] for hosts managing several bridges

mod bridge;
mod correlator;
mod dispatcher;
mod invoker;
mod registry;

pub use bridge::Bridge;
pub use correlator::{CallbackCorrelator, PendingReply, Resolution};
pub use dispatcher::{Dispatch, InboundDispatcher};
pub use invoker::OutboundInvoker;
pub use registry::BridgeRegistry;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Bridge, BridgeRegistry, CallbackCorrelator, Dispatch, InboundDispatcher, OutboundInvoker,
        PendingReply, Resolution,
    };
}
