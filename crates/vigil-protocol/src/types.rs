//! Core protocol types for Vigil's wire format.
//!
//! The keepalive protocol needs remarkably little vocabulary: a probe, an
//! ack, and a polite goodbye. Probes and acks are deliberately empty
//! markers; their only significance is their type and the moment they
//! arrive.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A semantic keepalive message.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, so a probe
/// is `{ "type": "Probe" }` on the wire. This keeps the format trivial
/// to inspect and to generate from any peer implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// The liveness check sent by the client role at each interval.
    /// Carries no payload; arrival time is the whole point.
    Probe,

    /// The reply sent by the server role immediately upon receiving a
    /// probe. Also empty.
    Ack,

    /// Either direction: "I'm going away on purpose."
    /// Lets the remote side distinguish a clean shutdown from a silent
    /// death, so it can stop its keepalive session without declaring a
    /// peer timeout.
    Goodbye { reason: String },
}

impl Message {
    /// Whether this message refreshes the server role's liveness window.
    pub fn is_probe(&self) -> bool {
        matches!(self, Message::Probe)
    }

    /// Whether this message refreshes the client role's liveness window.
    pub fn is_ack(&self) -> bool {
        matches!(self, Message::Ack)
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// The top-level wrapper. Every record on the wire is a Frame.
///
/// The metadata is diagnostic only: the keepalive logic never reads `seq`
/// or `timestamp`, but they make captured traffic debuggable and leave
/// room for other sub-protocols to share the framing later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Auto-incrementing sequence number. Each side maintains its own
    /// counter.
    pub seq: u64,

    /// Milliseconds since the sending side attached to the connection.
    pub timestamp: u64,

    /// The actual message content.
    pub message: Message,
}

// =========================================================================
// Tests
// =========================================================================
