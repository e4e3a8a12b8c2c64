//! Demo: a client/server keepalive pair over a local WebSocket.
//!
//! Starts a listener on a random loopback port, dials it, attaches a
//! keepalive session to each end, and logs the probe/ack traffic until
//! Ctrl-C. Run with `RUST_LOG=vigil_keepalive=trace` to watch every
//! probe go by.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vigil::{KeepAliveConfig, Manager, Peer, Role, SessionId, VigilError};
use vigil_transport::{
    Listener, TransportError, WebSocketChannel, WebSocketListener,
};

/// Logs timeouts; a real manager would reconnect or drop the connection.
struct LogManager {
    side: &'static str,
}

impl Manager for LogManager {
    async fn peer_timed_out(&self, session: SessionId) {
        tracing::error!(%session, side = self.side, "peer timed out");
    }
}

#[tokio::main]
async fn main() -> Result<(), VigilError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vigil=debug".into()),
        )
        .init();

    let mut listener = WebSocketListener::bind("127.0.0.1:0").await?;
    let addr = listener
        .local_addr()
        .map_err(TransportError::AcceptFailed)?
        .to_string();
    tracing::info!(addr, "demo listening");

    // A short interval so the demo shows traffic without a 20 s wait.
    let config = KeepAliveConfig {
        interval: Duration::from_secs(2),
        tolerance: Duration::from_millis(100),
        initial_jitter_us: 0,
    };

    let (server_ch, client_ch) = tokio::join!(
        listener.accept(),
        WebSocketChannel::connect(&addr),
    );

    let server = Peer::attach(
        server_ch?,
        Role::Server,
        config.clone(),
        LogManager { side: "server" },
    )
    .await?;
    let client = Peer::attach(
        client_ch?,
        Role::Client,
        config,
        LogManager { side: "client" },
    )
    .await?;

    tracing::info!(
        server = %server.id(),
        client = %client.id(),
        "pair running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(TransportError::AcceptFailed)?;

    client.shutdown("demo over").await?;
    // The goodbye above already tears the server side down; ignore the
    // double close.
    let _ = server.shutdown("demo over").await;
    Ok(())
}
