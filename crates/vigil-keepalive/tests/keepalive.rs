//! Integration tests for the keepalive session actor.
//!
//! Uses `tokio::time::pause()` (via `start_paused = true`) to control
//! time deterministically: `tokio::time::advance` moves the clock, the
//! actor's `sleep_until` fires instantly, and `tokio::time::Instant`
//! reads the mocked now. No test here waits on the wall clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use vigil_keepalive::{
    start_as_client, start_as_server, KeepAliveConfig, KeepAliveError,
    Manager, MessageSink, SessionId,
};
use vigil_protocol::Message;

// =========================================================================
// Mock sink and manager
// =========================================================================

/// Records every message the session sends; can be made to fail.
#[derive(Clone, Default)]
struct MockSink {
    sent: Arc<Mutex<Vec<Message>>>,
    fail: Arc<AtomicBool>,
}

impl MockSink {
    fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    fn probes(&self) -> usize {
        self.sent().iter().filter(|m| m.is_probe()).count()
    }

    fn acks(&self) -> usize {
        self.sent().iter().filter(|m| m.is_ack()).count()
    }

    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl MessageSink for MockSink {
    async fn send(&self, msg: Message) -> Result<(), KeepAliveError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(KeepAliveError::ChannelUnavailable(
                "mock channel down".into(),
            ));
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

/// Forwards timeout notifications onto an mpsc channel so tests can
/// await them (or assert their absence with `try_recv`).
#[derive(Clone)]
struct MockManager {
    tx: mpsc::UnboundedSender<SessionId>,
}

impl MockManager {
    fn new() -> (Self, mpsc::UnboundedReceiver<SessionId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Manager for MockManager {
    async fn peer_timed_out(&self, session: SessionId) {
        let _ = self.tx.send(session);
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Default-shaped test config: 20 s interval, 100 ms tolerance, no jitter.
fn config() -> KeepAliveConfig {
    KeepAliveConfig::default()
}

const INTERVAL: Duration = Duration::from_secs(20);

/// Lets the session actor run until it has processed everything queued.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advances the paused clock and lets the actor process the wake-up.
async fn advance(d: Duration) {
    tokio::time::advance(d).await;
    settle().await;
}

// =========================================================================
// Client role
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_client_sends_one_probe_at_start() {
    let sink = MockSink::default();
    let (manager, _rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .expect("start should succeed");

    // Exactly one probe before any wake-up fires.
    assert_eq!(sink.sent(), vec![Message::Probe]);
    assert!(handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_client_start_fails_when_channel_gone() {
    let sink = MockSink::default();
    sink.set_fail(true);
    let (manager, mut rx) = MockManager::new();

    let result = start_as_client(sink, manager, config()).await;
    assert!(matches!(
        result,
        Err(KeepAliveError::ChannelUnavailable(_))
    ));
    // The failure is the caller's to handle; no session, no notification.
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_client_probes_every_interval_while_acked() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();

    for _ in 0..5 {
        handle.on_ack_received().await;
        advance(INTERVAL).await;
    }

    // Initial probe plus one per wake-up, and never a timeout.
    assert_eq!(sink.probes(), 6);
    assert_eq!(sink.acks(), 0);
    assert!(rx.try_recv().is_err());
    assert!(handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_client_does_not_time_out_at_exact_interval() {
    // Scenario B boundary: at the first wake-up elapsed equals the
    // interval, which does not exceed interval + tolerance.
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();

    advance(INTERVAL).await;

    assert!(rx.try_recv().is_err());
    assert!(handle.is_running());
    assert_eq!(sink.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_times_out_at_second_wakeup_without_acks() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();

    advance(INTERVAL).await;
    assert!(rx.try_recv().is_err());

    advance(INTERVAL).await;

    // Exactly one notification, for this session, and the actor is gone.
    assert_eq!(rx.try_recv().unwrap(), handle.id());
    assert!(rx.try_recv().is_err());
    assert!(!handle.is_running());

    // No probe accompanies the timeout wake-up: start + first wake only.
    assert_eq!(sink.probes(), 2);

    // Long after termination nothing stirs.
    advance(INTERVAL * 4).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(sink.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_probe_send_failure_notifies_manager() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();

    // The channel dies between wake-ups.
    sink.set_fail(true);
    advance(INTERVAL).await;

    assert_eq!(rx.try_recv().unwrap(), handle.id());
    assert!(rx.try_recv().is_err());
    assert!(!handle.is_running());
}

// =========================================================================
// Server role
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_server_sends_nothing_at_start() {
    let sink = MockSink::default();
    let (manager, _rx) = MockManager::new();

    let handle = start_as_server(sink.clone(), manager, config());
    settle().await;

    assert!(sink.sent().is_empty());
    assert!(handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_server_acks_each_probe_exactly_once() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_server(sink.clone(), manager, config());

    for expected in 1..=4 {
        handle.on_probe_received().await.expect("ack should send");
        assert_eq!(sink.acks(), expected);
        advance(INTERVAL).await;
    }

    // Acks only, never a probe, never a timeout.
    assert_eq!(sink.probes(), 0);
    assert!(rx.try_recv().is_err());
    assert!(handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_server_times_out_at_second_wakeup_without_probes() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_server(sink.clone(), manager, config());

    advance(INTERVAL).await;
    assert!(rx.try_recv().is_err());

    advance(INTERVAL).await;

    assert_eq!(rx.try_recv().unwrap(), handle.id());
    assert!(rx.try_recv().is_err());
    assert!(!handle.is_running());
    // The server never sent anything at all.
    assert!(sink.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_server_ack_send_failure_surfaces_but_does_not_time_out() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_server(sink.clone(), manager, config());

    sink.set_fail(true);
    let result = handle.on_probe_received().await;
    assert!(matches!(
        result,
        Err(KeepAliveError::ChannelUnavailable(_))
    ));

    // The failed ack is the dispatcher's problem; the session lives on
    // and the manager hears nothing.
    assert!(rx.try_recv().is_err());
    assert!(handle.is_running());

    // The probe still refreshed the window, so the session recovers once
    // the channel does.
    sink.set_fail(false);
    handle.on_probe_received().await.expect("ack should send");
    advance(INTERVAL).await;
    assert!(rx.try_recv().is_err());
    assert!(handle.is_running());
}

// =========================================================================
// Stop and terminal behavior
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_action_and_notification() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();

    handle.stop().await;
    settle().await;
    assert!(!handle.is_running());

    // Way past every threshold: no probe, no notification.
    advance(INTERVAL * 5).await;
    assert_eq!(sink.probes(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_events_after_stop_are_noops() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_server(sink.clone(), manager, config());
    handle.stop().await;
    settle().await;

    // Probes and acks after the end mutate nothing and ack nothing.
    handle.on_probe_received().await.expect("no-op should be Ok");
    handle.on_ack_received().await;
    assert!(sink.sent().is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_redundant_stop_is_diagnostic_only() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_client(sink, manager, config()).await.unwrap();

    handle.stop().await;
    settle().await;
    // Second stop hits the closed queue: logged, not escalated.
    handle.stop().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_no_second_notification_after_timeout() {
    let sink = MockSink::default();
    let (manager, mut rx) = MockManager::new();

    let handle = start_as_server(sink, manager, config());

    advance(INTERVAL).await;
    advance(INTERVAL).await;
    assert_eq!(rx.try_recv().unwrap(), handle.id());

    // Late events against the terminal session change nothing.
    handle.on_probe_received().await.expect("no-op should be Ok");
    handle.on_ack_received().await;
    advance(INTERVAL * 3).await;
    assert!(rx.try_recv().is_err());
}

// =========================================================================
// Identity
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_sessions_get_distinct_ids_and_roles() {
    let sink = MockSink::default();
    let (manager, _rx) = MockManager::new();
    let (manager2, _rx2) = MockManager::new();

    let client = start_as_client(sink.clone(), manager, config())
        .await
        .unwrap();
    let server = start_as_server(sink, manager2, config());

    assert_ne!(client.id(), server.id());
    assert_eq!(client.role(), vigil_keepalive::Role::Client);
    assert_eq!(server.role(), vigil_keepalive::Role::Server);
    assert!(client.id().to_string().starts_with("ka-"));
}
