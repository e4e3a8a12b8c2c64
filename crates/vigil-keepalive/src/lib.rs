//! Peer liveness detection for Vigil.
//!
//! This crate implements the KeepAlive sub-protocol: a symmetric liveness
//! check that runs atop one bidirectional channel between exactly two
//! peers. The client role sends a probe every interval; the server role
//! answers each probe with an ack. Each side watches for the signal it
//! expects from the other (the client watches acks, the server watches
//! probes) and declares a peer timeout when nothing has arrived for
//! longer than `interval + tolerance`.
//!
//! # Design
//!
//! One [session](start_as_client) is one Tokio actor task. All timestamp
//! state lives inside the actor; inbound probe/ack events and stop
//! requests reach it through an mpsc queue via [`KeepAliveHandle`], so no
//! locking is needed. The actor re-arms its own wake-up with
//! `tokio::time::sleep_until`, which makes the elapsed-time logic fully
//! deterministic under Tokio's paused test clock.
//!
//! The session never retries and never reconnects. When it detects a
//! dead peer it tells its [`Manager`] exactly once and terminates; what
//! happens to the connection after that is the manager's policy.

mod config;
mod error;
mod liveness;
mod session;

pub use config::{KeepAliveConfig, DEFAULT_INTERVAL, DEFAULT_TOLERANCE};
pub use error::KeepAliveError;
pub use liveness::{LivenessWindow, Role};
pub use session::{
    start_as_client, start_as_server, KeepAliveHandle, Manager,
    MessageSink, SessionId,
};
