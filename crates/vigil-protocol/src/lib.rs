//! Wire protocol for Vigil.
//!
//! This crate defines what the two peers of a connection actually say to
//! each other:
//!
//! - **Types** ([`Frame`], [`Message`]): the structures that travel on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw byte records) and
//! the keepalive session (semantic probe/ack events). It knows nothing
//! about sockets or timers; it only knows how to name and serialize
//! messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → KeepAlive (probe/ack events)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Frame, Message};
