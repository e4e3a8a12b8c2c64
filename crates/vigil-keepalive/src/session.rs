//! KeepAlive session actor: an isolated Tokio task that owns the
//! liveness state for one connection.
//!
//! Each session runs in its own task, communicating with the outside
//! world through an mpsc channel. Wake-up evaluation and inbound
//! probe/ack events are therefore serialized by construction; there is
//! no shared timestamp state to lock.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};
use vigil_protocol::Message;

use crate::{KeepAliveConfig, KeepAliveError, LivenessWindow, Role};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Capacity of a session's event queue. Events are tiny and the actor
/// drains them promptly; this only guards against a runaway dispatcher.
const EVENT_QUEUE_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier for a keepalive session, passed to the [`Manager`]
/// on timeout so it can tell sessions apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ka-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Capabilities consumed from collaborators
// ---------------------------------------------------------------------------

/// The send half of the connection's channel, as the session sees it.
///
/// Implementors wrap their transport and codec and map failures into
/// [`KeepAliveError::ChannelUnavailable`]. Sending is fire-and-forget
/// from the protocol's perspective: it either succeeds or fails when
/// called, and the session never retries.
pub trait MessageSink: Send + Sync + 'static {
    /// Sends one semantic keepalive message to the remote peer.
    fn send(
        &self,
        msg: Message,
    ) -> impl Future<Output = Result<(), KeepAliveError>> + Send;
}

/// The owner of the connection, notified when the peer is unresponsive.
///
/// Notified at most once per session lifetime. Teardown and reconnection
/// policy belong entirely to the manager; the session only reports.
pub trait Manager: Send + Sync + 'static {
    /// Called exactly once when the session declares a peer timeout.
    fn peer_timed_out(
        &self,
        session: SessionId,
    ) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// Events and handle
// ---------------------------------------------------------------------------

/// Events delivered to the session actor from the receive path.
enum Event {
    /// A probe arrived on the channel. The reply carries the result of
    /// the ack send, which the dispatch layer may want to observe.
    ProbeReceived {
        reply: oneshot::Sender<Result<(), KeepAliveError>>,
    },
    /// An ack arrived on the channel.
    AckReceived,
    /// Advisory request to cease. Terminal, but notifies nobody.
    Stop,
}

/// Handle to a running keepalive session. Used by the message-dispatch
/// layer to feed inbound events in, and by the owner to stop the session.
///
/// Cheap to clone; it's an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct KeepAliveHandle {
    id: SessionId,
    role: Role,
    events: mpsc::Sender<Event>,
}

impl KeepAliveHandle {
    /// The session's unique ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The role this session was started with.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the session is still running. Becomes false once a
    /// timeout was declared or the session was stopped.
    pub fn is_running(&self) -> bool {
        !self.events.is_closed()
    }

    /// Reports that a probe arrived on the channel for this session.
    ///
    /// The server role refreshes its liveness window and immediately
    /// sends an ack; a failed ack send is returned to the caller but
    /// does NOT declare a timeout. After the session has ended this is
    /// a no-op.
    pub async fn on_probe_received(&self) -> Result<(), KeepAliveError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .events
            .send(Event::ProbeReceived { reply: reply_tx })
            .await
            .is_err()
        {
            trace!(id = %self.id, "probe after session end, ignoring");
            return Ok(());
        }
        // A dropped reply means the session ended before handling the
        // probe; nothing to ack, nothing to report.
        reply_rx.await.unwrap_or(Ok(()))
    }

    /// Reports that an ack arrived on the channel for this session.
    /// Pure liveness signal; after the session has ended this is a no-op.
    pub async fn on_ack_received(&self) {
        if self.events.send(Event::AckReceived).await.is_err() {
            trace!(id = %self.id, "ack after session end, ignoring");
        }
    }

    /// Asks the session to cease. The pending wake-up becomes a no-op
    /// and the manager is not notified. Stopping a session that already
    /// ended is logged as a diagnostic and otherwise ignored.
    pub async fn stop(&self) {
        if self.events.send(Event::Stop).await.is_err() {
            warn!(
                id = %self.id,
                "asked to stop a keepalive session that already ended"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Starts a keepalive session in the client role.
///
/// Sends the first probe immediately; a failure there is returned to the
/// caller and no session is spawned. On success the session wakes every
/// `interval` to check for acks and send the next probe.
pub async fn start_as_client<S, M>(
    sink: S,
    manager: M,
    config: KeepAliveConfig,
) -> Result<KeepAliveHandle, KeepAliveError>
where
    S: MessageSink,
    M: Manager,
{
    let config = config.validated();
    sink.send(Message::Probe).await?;
    Ok(spawn_session(Role::Client, sink, manager, config))
}

/// Starts a keepalive session in the server role.
///
/// Sends nothing; the session wakes every `interval` to check that the
/// peer's probes keep arriving. Acks are sent from
/// [`KeepAliveHandle::on_probe_received`].
pub fn start_as_server<S, M>(
    sink: S,
    manager: M,
    config: KeepAliveConfig,
) -> KeepAliveHandle
where
    S: MessageSink,
    M: Manager,
{
    spawn_session(Role::Server, sink, manager, config.validated())
}

/// Spawns the session actor task and returns a handle to it.
fn spawn_session<S, M>(
    role: Role,
    sink: S,
    manager: M,
    config: KeepAliveConfig,
) -> KeepAliveHandle
where
    S: MessageSink,
    M: Manager,
{
    let id = SessionId::next();
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_SIZE);

    // Baseline the watched timestamp at start time, never at an epoch,
    // so the first wake-up cannot see elapsed time covering the
    // session's absence.
    let window = LivenessWindow::new(config.threshold(), Instant::now());

    let actor = SessionActor {
        id,
        role,
        config,
        window,
        sink,
        manager,
    };
    tokio::spawn(actor.run(rx));

    KeepAliveHandle {
        id,
        role,
        events: tx,
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The internal session actor state. Runs inside a Tokio task.
struct SessionActor<S: MessageSink, M: Manager> {
    id: SessionId,
    role: Role,
    config: KeepAliveConfig,
    window: LivenessWindow,
    sink: S,
    manager: M,
}

impl<S: MessageSink, M: Manager> SessionActor<S, M> {
    /// Runs the actor loop until a timeout is declared or a stop arrives.
    ///
    /// Returning from this function is the one and only terminal
    /// transition: it closes the event queue, which is what
    /// [`KeepAliveHandle::is_running`] observes.
    async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        let interval = self.config.interval;
        let mut next_wake = Instant::now() + interval + self.initial_jitter();

        debug!(
            id = %self.id,
            role = %self.role,
            interval_ms = interval.as_millis() as u64,
            tolerance_ms = self.config.tolerance.as_millis() as u64,
            "keepalive session started"
        );

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(Event::ProbeReceived { reply }) => {
                        let result = self.handle_probe().await;
                        let _ = reply.send(result);
                    }
                    Some(Event::AckReceived) => self.handle_ack(),
                    Some(Event::Stop) | None => {
                        debug!(
                            id = %self.id,
                            role = %self.role,
                            "keepalive session stopped"
                        );
                        return;
                    }
                },
                _ = time::sleep_until(next_wake) => {
                    let now = Instant::now();
                    if self.window.is_expired(now) {
                        warn!(
                            id = %self.id,
                            role = %self.role,
                            watched = self.role.watched_signal(),
                            elapsed_ms =
                                self.window.elapsed(now).as_millis() as u64,
                            "peer timed out"
                        );
                        self.manager.peer_timed_out(self.id).await;
                        return;
                    }
                    // The role's periodic action: the client probes, the
                    // server only re-arms.
                    if self.role == Role::Client {
                        if let Err(e) = self.sink.send(Message::Probe).await {
                            warn!(
                                id = %self.id,
                                error = %e,
                                "probe send failed, reporting peer unavailable"
                            );
                            self.manager.peer_timed_out(self.id).await;
                            return;
                        }
                        trace!(id = %self.id, "probe sent");
                    }
                    next_wake = Instant::now() + interval;
                }
            }
        }
    }

    /// Server role: refresh the window and answer with an ack. A probe
    /// reaching a client-role session is a peer protocol violation;
    /// it is logged and ignored rather than acked.
    async fn handle_probe(&mut self) -> Result<(), KeepAliveError> {
        match self.role {
            Role::Server => {
                self.window.refresh(Instant::now());
                self.sink.send(Message::Ack).await
            }
            Role::Client => {
                debug!(
                    id = %self.id,
                    "probe received on client side, ignoring"
                );
                Ok(())
            }
        }
    }

    /// Client role: refresh the window. Acks mean nothing to a server.
    fn handle_ack(&mut self) {
        match self.role {
            Role::Client => self.window.refresh(Instant::now()),
            Role::Server => debug!(
                id = %self.id,
                "ack received on server side, ignoring"
            ),
        }
    }

    fn initial_jitter(&self) -> Duration {
        if self.config.initial_jitter_us > 0 {
            let us = rand::rng().random_range(0..self.config.initial_jitter_us);
            Duration::from_micros(us)
        } else {
            Duration::ZERO
        }
    }
}
