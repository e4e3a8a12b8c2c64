//! Error types for the keepalive layer.

/// Errors that can occur while running a keepalive session.
#[derive(Debug, thiserror::Error)]
pub enum KeepAliveError {
    /// A probe or ack could not be handed to the channel.
    ///
    /// For the client role's periodic probe this is treated exactly like
    /// a detected timeout (the manager is notified and the session
    /// terminates). For the server role's ack it is surfaced to the
    /// caller of [`KeepAliveHandle::on_probe_received`] and the session
    /// keeps running; only the elapsed-time check declares timeouts.
    ///
    /// [`KeepAliveHandle::on_probe_received`]: crate::KeepAliveHandle::on_probe_received
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),
}
