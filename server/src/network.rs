//! Server network layer accepting WebSocket connections and feeding the relay

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ServerMessage, DEFAULT_PORT};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::connection::{ConnectionId, OUTBOX_CAPACITY};
use crate::registry::SessionRegistry;
use crate::relay::{Relay, RelayEvent};

pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_sessions: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// Relay server bound to a TCP listener
pub struct Server {
    listener: TcpListener,
    max_sessions: usize,
    next_connection_id: ConnectionId,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            max_sessions: config.max_sessions,
            next_connection_id: 1,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, handing each one its own task.
    pub async fn run(mut self) -> io::Result<()> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let relay = Relay::new(SessionRegistry::new(self.max_sessions));
        tokio::spawn(relay.run(events_rx));

        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = self.next_connection_id;
                    self.next_connection_id += 1;
                    tokio::spawn(handle_connection(stream, addr, id, events_tx.clone()));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Drives one WebSocket: a writer task drains the outbox while this task
/// forwards inbound text frames to the relay.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    id: ConnectionId,
    events: mpsc::UnboundedSender<RelayEvent>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut source) = ws_stream.split();

    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    if events
        .send(RelayEvent::Connected { id, addr, outbox })
        .is_err()
    {
        error!("Relay is gone, dropping connection from {}", addr);
        return;
    }

    tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode message for connection {}: {}", id, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Write to connection {} failed: {}", id, e);
                break;
            }
        }
        if let Err(e) = sink.close().await {
            debug!("Closing connection {} failed: {}", id, e);
        }
    });

    while let Some(frame) = source.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Read from connection {} failed: {}", id, e);
                break;
            }
        };
        if events.send(RelayEvent::Frame { id, text }).is_err() {
            break;
        }
    }

    if events.send(RelayEvent::Disconnected { id }).is_err() {
        debug!("Relay already stopped when connection {} closed", id);
    }
}
