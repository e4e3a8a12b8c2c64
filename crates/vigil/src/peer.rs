//! Per-connection glue: frame encoding, inbound dispatch, and teardown.
//!
//! [`Peer`] owns one transport channel and runs the plumbing the
//! keepalive session treats as external collaborators:
//!   1. Encode outbound probe/ack messages into [`Frame`]s and send them
//!   2. Loop: receive records, decode frames, dispatch by message type
//!      to the keepalive session
//!   3. On a declared peer timeout, close the channel and forward the
//!      notification to the caller's [`Manager`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use vigil_keepalive::{
    self as keepalive, KeepAliveConfig, KeepAliveError, KeepAliveHandle,
    Manager, MessageSink, Role, SessionId,
};
use vigil_protocol::{Codec, Frame, JsonCodec, Message};
use vigil_transport::{Channel, ChannelId, TransportError};

use crate::VigilError;

/// A connection with a keepalive session attached.
///
/// Dropping a `Peer` does not kill the protocol; the session actor and
/// the read loop keep the channel alive until a timeout, a goodbye, or
/// [`shutdown`](Self::shutdown).
pub struct Peer<C: Channel<Error = TransportError>> {
    id: ChannelId,
    channel: Arc<C>,
    keepalive: KeepAliveHandle,
    reader: JoinHandle<()>,
}

impl<C: Channel<Error = TransportError>> Peer<C> {
    /// Attaches a keepalive session to `channel` in the given role and
    /// starts the inbound dispatch loop.
    ///
    /// `manager` is told when the remote peer is deemed dead, whether
    /// its keepalive signals stopped arriving or the channel itself
    /// failed. The channel has already been closed by then, so the
    /// manager only decides what happens to the connection's owner
    /// (reconnect, drop, alert).
    pub async fn attach<M: Manager>(
        channel: C,
        role: Role,
        config: KeepAliveConfig,
        manager: M,
    ) -> Result<Self, VigilError> {
        let channel = Arc::new(channel);
        let id = channel.id();

        let sink = FrameSink {
            channel: Arc::clone(&channel),
            codec: JsonCodec,
            seq: AtomicU64::new(1),
            epoch: Instant::now(),
        };
        let teardown = Teardown {
            channel: Arc::clone(&channel),
            inner: Arc::new(manager),
        };

        let keepalive = match role {
            Role::Client => {
                keepalive::start_as_client(sink, teardown.clone(), config)
                    .await?
            }
            Role::Server => {
                keepalive::start_as_server(sink, teardown.clone(), config)
            }
        };

        tracing::info!(%id, session = %keepalive.id(), %role, "keepalive attached");

        let reader = tokio::spawn(read_loop(
            Arc::clone(&channel),
            keepalive.clone(),
            teardown,
        ));

        Ok(Self {
            id,
            channel,
            keepalive,
            reader,
        })
    }

    /// The underlying channel's ID.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Handle to the attached keepalive session.
    pub fn keepalive(&self) -> &KeepAliveHandle {
        &self.keepalive
    }

    /// Cleanly shuts the connection down: tells the remote peer goodbye
    /// (best effort), stops the keepalive session, and closes the
    /// channel.
    pub async fn shutdown(self, reason: &str) -> Result<(), VigilError> {
        let frame = Frame {
            seq: 0,
            timestamp: 0,
            message: Message::Goodbye {
                reason: reason.to_string(),
            },
        };
        if let Ok(bytes) = JsonCodec.encode(&frame) {
            // The peer may already be gone; goodbye is a courtesy.
            let _ = self.channel.send(&bytes).await;
        }

        if self.keepalive.is_running() {
            self.keepalive.stop().await;
        }
        self.reader.abort();
        self.channel.close().await?;
        tracing::info!(id = %self.id, reason, "peer shut down");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MessageSink adapter
// ---------------------------------------------------------------------------

/// Wraps the channel and codec into the send capability the keepalive
/// session consumes.
struct FrameSink<C> {
    channel: Arc<C>,
    codec: JsonCodec,
    seq: AtomicU64,
    epoch: Instant,
}

impl<C: Channel<Error = TransportError>> MessageSink for FrameSink<C> {
    async fn send(&self, msg: Message) -> Result<(), KeepAliveError> {
        let frame = Frame {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            timestamp: self.epoch.elapsed().as_millis() as u64,
            message: msg,
        };
        let bytes = self.codec.encode(&frame).map_err(|e| {
            KeepAliveError::ChannelUnavailable(e.to_string())
        })?;
        self.channel
            .send(&bytes)
            .await
            .map_err(|e| KeepAliveError::ChannelUnavailable(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Manager adapter
// ---------------------------------------------------------------------------

/// Closes the channel on a peer timeout, then forwards the notification
/// to the caller's manager. Shared between the keepalive session (which
/// reports elapsed-time timeouts) and the read loop (which reports a
/// channel that died under the session).
struct Teardown<C, M> {
    channel: Arc<C>,
    inner: Arc<M>,
}

impl<C, M> Clone for Teardown<C, M> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, M> Manager for Teardown<C, M>
where
    C: Channel<Error = TransportError>,
    M: Manager,
{
    async fn peer_timed_out(&self, session: SessionId) {
        tracing::warn!(
            %session,
            id = %self.channel.id(),
            "peer timed out, closing channel"
        );
        if let Err(e) = self.channel.close().await {
            tracing::debug!(
                id = %self.channel.id(),
                error = %e,
                "close after timeout failed"
            );
        }
        self.inner.peer_timed_out(session).await;
    }
}

// ---------------------------------------------------------------------------
// Inbound dispatch
// ---------------------------------------------------------------------------

/// Receives records, decodes frames, and routes probe/ack events to the
/// keepalive session. Exits when the channel closes or the remote peer
/// says goodbye; a receive *error* counts as a dead peer and is reported
/// through `notify`, so the owner hears about it exactly as it would
/// about an elapsed-time timeout.
async fn read_loop<C, M>(
    channel: Arc<C>,
    keepalive: KeepAliveHandle,
    notify: Teardown<C, M>,
) where
    C: Channel<Error = TransportError>,
    M: Manager,
{
    let codec = JsonCodec;
    let id = channel.id();

    loop {
        match channel.recv().await {
            Ok(Some(data)) => {
                let frame: Frame = match codec.decode(&data) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(
                            %id,
                            error = %e,
                            "undecodable frame, skipping"
                        );
                        continue;
                    }
                };

                match frame.message {
                    Message::Probe => {
                        if let Err(e) = keepalive.on_probe_received().await {
                            tracing::warn!(
                                %id,
                                error = %e,
                                "failed to ack probe"
                            );
                        }
                    }
                    Message::Ack => keepalive.on_ack_received().await,
                    Message::Goodbye { reason } => {
                        tracing::info!(%id, %reason, "peer said goodbye");
                        if keepalive.is_running() {
                            keepalive.stop().await;
                        }
                        let _ = channel.close().await;
                        return;
                    }
                }
            }
            Ok(None) => {
                tracing::info!(%id, "channel closed");
                if keepalive.is_running() {
                    keepalive.stop().await;
                }
                return;
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "channel failed");
                // An unclean channel death is news the session's own
                // wake-up may never get to deliver; report it here. A
                // session that already ended has already reported.
                if keepalive.is_running() {
                    keepalive.stop().await;
                    notify.peer_timed_out(keepalive.id()).await;
                }
                return;
            }
        }
    }
}
