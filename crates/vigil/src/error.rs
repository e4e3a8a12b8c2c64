//! Unified error type for the Vigil stack.

use vigil_keepalive::KeepAliveError;
use vigil_protocol::ProtocolError;
use vigil_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `vigil` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A keepalive-level error (channel unavailable).
    #[error(transparent)]
    KeepAlive(#[from] KeepAliveError),
}
