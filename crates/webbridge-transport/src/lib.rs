//! webbridge-transport - Envelope, codec, and transport binding
//!
//! This crate provides:
//! - [`Envelope`] the method/callbackId/params triple exchanged in both directions
//! - [`Codec`] trait and [`JsonCodec`] for envelope (de)serialization and
//!   construction of the remote scripts that carry envelopes
//! - [`Transport`] trait for the platform delivery mechanism, with the weak
//!   [`TransportHandle`] binding and a channel-backed [`ChannelTransport`]

mod codec;
mod envelope;
mod transport;

pub use codec::{Codec, CodecError, JsonCodec, RawMessage, escape_script_literal};
pub use envelope::Envelope;
pub use transport::{ChannelTransport, Transport, TransportError, TransportHandle};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ChannelTransport, Codec, CodecError, Envelope, JsonCodec, RawMessage, Transport,
        TransportError, TransportHandle,
    };
}
