//! Channel abstraction layer for Vigil.
//!
//! Provides the [`Channel`] and [`Listener`] traits that abstract over the
//! reliable, ordered, bidirectional byte transport the keepalive protocol
//! runs on.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket channels via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketChannel, WebSocketListener};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Creates a new `ChannelId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan-{}", self.0)
    }
}

/// Accepts new incoming channels on the server side of a connection.
pub trait Listener: Send + 'static {
    /// The channel type produced by this listener.
    type Channel: Channel;
    /// The error type for listener operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming channel.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Channel, Self::Error>> + Send;

    /// Gracefully shuts down the listener, stopping new channels.
    fn shutdown(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A single bidirectional channel that can send and receive byte records.
///
/// The futures returned by these methods are `Send` so that generic code
/// built on a `Channel` can be driven from spawned Tokio tasks.
pub trait Channel: Send + Sync + 'static {
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a record to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next record from the remote peer.
    ///
    /// Returns `Ok(None)` when the channel is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the channel.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this channel.
    fn id(&self) -> ChannelId;
}
