//! Timing configuration for a keepalive session.

use std::time::Duration;

use tracing::warn;

/// Nominal probe interval. Both roles use the same cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(20);

/// Fixed grace padding added to the interval before a missing signal is
/// treated as a timeout, absorbing in-flight transmission delay.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_millis(100);

/// Full timing configuration for a keepalive session.
///
/// The defaults match the protocol constants (20 s interval, 100 ms
/// tolerance); tests and demos shrink them to keep runs fast.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// How often the session wakes up, and how often the client role
    /// sends a probe.
    pub interval: Duration,
    /// Extra grace on top of `interval` before declaring a peer timeout.
    /// Fixed, not adaptive.
    pub tolerance: Duration,
    /// Random jitter (0..max µs) added to the *first* wake-up only, to
    /// desynchronize many sessions started at the same instant.
    /// 0 (the default) disables jitter.
    pub initial_jitter_us: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            tolerance: DEFAULT_TOLERANCE,
            initial_jitter_us: 0,
        }
    }
}

impl KeepAliveConfig {
    /// Create a config with a specific interval and default tolerance.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when a session starts. Rules:
    /// - A zero `interval` is replaced with [`DEFAULT_INTERVAL`].
    /// - `tolerance` is capped at `interval`; a tolerance that large
    ///   would hide a whole missed cycle.
    /// - `initial_jitter_us` is capped at `tolerance`; a jittered first
    ///   wake-up must still land inside the grace window, or a session
    ///   would time out on its very first check even against a live
    ///   peer.
    pub fn validated(mut self) -> Self {
        if self.interval.is_zero() {
            warn!(
                default_ms = DEFAULT_INTERVAL.as_millis() as u64,
                "keepalive interval is zero, using default"
            );
            self.interval = DEFAULT_INTERVAL;
        }
        if self.tolerance > self.interval {
            warn!(
                tolerance_ms = self.tolerance.as_millis() as u64,
                interval_ms = self.interval.as_millis() as u64,
                "keepalive tolerance exceeds interval, clamping"
            );
            self.tolerance = self.interval;
        }
        if Duration::from_micros(self.initial_jitter_us) > self.tolerance {
            warn!(
                jitter_us = self.initial_jitter_us,
                tolerance_ms = self.tolerance.as_millis() as u64,
                "keepalive jitter exceeds tolerance, clamping"
            );
            self.initial_jitter_us = self.tolerance.as_micros() as u64;
        }
        self
    }

    /// The elapsed-time threshold beyond which the peer is considered
    /// dead: `interval + tolerance`.
    pub fn threshold(&self) -> Duration {
        self.interval + self.tolerance
    }
}
