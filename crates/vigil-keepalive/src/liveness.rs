//! Role definitions and the pure elapsed-time logic behind timeouts.
//!
//! [`LivenessWindow`] is deliberately free of I/O and scheduling: it is a
//! timestamp plus a threshold. The session actor feeds it the current
//! instant at each wake-up; everything interesting about timeout
//! detection is testable right here without a runtime.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of the keepalive protocol a session plays.
///
/// Both roles share the same wake-up/timeout skeleton; they differ only
/// in which inbound signal refreshes the liveness window and in what the
/// periodic action is (the client probes, the server just re-arms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends a probe every interval and watches for acks.
    Client,
    /// Answers probes with acks and watches for probes.
    Server,
}

impl Role {
    /// The inbound signal this role watches for liveness.
    pub fn watched_signal(&self) -> &'static str {
        match self {
            Role::Client => "ack",
            Role::Server => "probe",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

// ---------------------------------------------------------------------------
// LivenessWindow
// ---------------------------------------------------------------------------

/// Tracks when the watched signal was last seen and decides whether the
/// silence has exceeded the timeout threshold.
///
/// The window is always constructed from the session's start instant, so
/// a freshly started session can never spuriously see elapsed time that
/// covers its own absence.
///
/// Uses `tokio::time::Instant` so the arithmetic honors Tokio's paused
/// test clock.
#[derive(Debug, Clone)]
pub struct LivenessWindow {
    threshold: Duration,
    last_seen: Instant,
}

impl LivenessWindow {
    /// Creates a window with the given threshold, baselined at `now`.
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_seen: now,
        }
    }

    /// Records that the watched signal arrived at `now`.
    pub fn refresh(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Time elapsed since the watched signal was last seen.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.duration_since(self.last_seen)
    }

    /// Whether the silence has exceeded the threshold.
    ///
    /// The comparison is strictly greater-than: elapsed time exactly
    /// equal to the threshold does not yet count as a timeout.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) > self.threshold
    }

    /// The configured timeout threshold.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}
