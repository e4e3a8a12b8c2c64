//! WebSocket channel implementation using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

use crate::{Channel, ChannelId, Listener, TransportError};

/// Counter for generating unique channel IDs.
static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<
    MaybeTlsStream<tokio::net::TcpStream>,
>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// A WebSocket-based [`Listener`] that waits for incoming channels.
pub struct WebSocketListener {
    listener: TcpListener,
}

impl WebSocketListener {
    /// Binds a new WebSocket listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Listener for WebSocketListener {
    type Channel = WebSocketChannel;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Channel, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws =
            tokio_tungstenite::accept_async(MaybeTlsStream::Plain(stream))
                .await
                .map_err(|e| {
                    TransportError::AcceptFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ))
                })?;

        let channel = WebSocketChannel::new(ws);
        tracing::debug!(id = %channel.id, %addr, "accepted WebSocket channel");
        Ok(channel)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single WebSocket channel, usable from either side of the connection.
///
/// The send and receive halves of the stream are locked independently, so
/// a task parked in [`recv`](Channel::recv) waiting for inbound data never
/// blocks another task's [`send`](Channel::send).
pub struct WebSocketChannel {
    id: ChannelId,
    sender: Mutex<WsSink>,
    receiver: Mutex<WsSource>,
}

impl WebSocketChannel {
    fn new(ws: WsStream) -> Self {
        let id = ChannelId::new(
            NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (sender, receiver) = ws.split();
        Self {
            id,
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
        }
    }

    /// Dials a remote WebSocket peer at `host:port`.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let (ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .map_err(|e| {
                    TransportError::ConnectFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ))
                })?;

        let channel = Self::new(ws);
        tracing::debug!(id = %channel.id, addr, "connected WebSocket channel");
        Ok(channel)
    }
}

impl Channel for WebSocketChannel {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sender.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.receiver.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sender.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ChannelId {
        self.id
    }
}
