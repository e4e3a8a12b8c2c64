//! # Vigil
//!
//! Liveness detection for long-lived peer connections.
//!
//! Vigil runs a symmetric KeepAlive sub-protocol over one bidirectional
//! channel: the client side probes on a fixed cadence, the server side
//! acks, and whichever side stops hearing from the other tears the
//! connection down. [`Peer`] is the batteries-included entry point that
//! wires a transport channel, the JSON frame codec, and a keepalive
//! session together; the sub-crates can also be used à la carte.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vigil::{KeepAliveConfig, Manager, Peer, Role, SessionId};
//! use vigil_transport::WebSocketChannel;
//!
//! struct LogOnTimeout;
//!
//! impl Manager for LogOnTimeout {
//!     async fn peer_timed_out(&self, session: SessionId) {
//!         eprintln!("{session}: peer is gone");
//!     }
//! }
//!
//! # async fn run() -> Result<(), vigil::VigilError> {
//! let channel = WebSocketChannel::connect("127.0.0.1:8080").await?;
//! let peer = Peer::attach(
//!     channel,
//!     Role::Client,
//!     KeepAliveConfig::default(),
//!     LogOnTimeout,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod peer;

pub use error::VigilError;
pub use peer::Peer;

pub use vigil_keepalive::{
    KeepAliveConfig, KeepAliveError, KeepAliveHandle, Manager, Role,
    SessionId,
};
pub use vigil_protocol::{Frame, Message, ProtocolError};
pub use vigil_transport::{Channel, ChannelId, TransportError};
