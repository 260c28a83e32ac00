//! Outbound handles for the live client connections.
//!
//! Each accepted WebSocket gets a writer task that drains a bounded channel.
//! The relay only ever talks to that channel, so a send never blocks and a
//! dead peer shows up as a closed channel instead of a socket error. A peer
//! that stops reading fills its channel and is treated as unavailable.

use log::{debug, info, warn};
use shared::{RelayError, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub type ConnectionId = u64;

/// Messages queued for one connection before further sends are refused.
pub const OUTBOX_CAPACITY: usize = 1000;

pub type Outbox = mpsc::Sender<ServerMessage>;

/// A live client connection as seen by the relay.
#[derive(Debug)]
pub struct Connection {
    /// Identifier assigned by the accept loop
    pub id: ConnectionId,
    /// Remote address of the client
    pub addr: SocketAddr,
    /// When the WebSocket handshake completed
    pub connected_at: Instant,
    /// Channel drained by the connection's writer task
    outbox: Outbox,
}

impl Connection {
    pub fn new(id: ConnectionId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            outbox,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.outbox.is_closed()
    }
}

#[derive(Debug, Default)]
pub struct Connections {
    /// Live connections indexed by id
    connections: HashMap<ConnectionId, Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ConnectionId, addr: SocketAddr, outbox: Outbox) {
        info!("Connection {} opened from {}", id, addr);
        self.connections.insert(id, Connection::new(id, addr, outbox));
    }

    /// Forgets a connection. Returns false if it was already gone.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        match self.connections.remove(&id) {
            Some(connection) => {
                info!(
                    "Connection {} from {} closed after {:.1}s",
                    id,
                    connection.addr,
                    connection.connected_at.elapsed().as_secs_f32()
                );
                true
            }
            None => false,
        }
    }

    /// Queues a message for a connection without waiting for room.
    pub fn send(&self, id: ConnectionId, message: ServerMessage) -> Result<(), RelayError> {
        let connection = self
            .connections
            .get(&id)
            .ok_or(RelayError::PeerUnavailable)?;
        connection.outbox.try_send(message).map_err(|e| {
            match e {
                TrySendError::Full(_) => warn!("Outbox of connection {} is full", id),
                TrySendError::Closed(_) => debug!("Outbox of connection {} is closed", id),
            }
            RelayError::PeerUnavailable
        })
    }

    pub fn is_live(&self, id: ConnectionId) -> bool {
        self.connections.get(&id).is_some_and(Connection::is_open)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
