//! The relay loop: a single task that owns the session registry and every
//! connection outbox, fed by the per-connection reader tasks.

use log::{debug, info, warn};
use serde_json::Value;
use shared::{ClientMessage, PlayerInfo, RelayError, ServerMessage};
use std::net::SocketAddr;
use tokio::sync::mpsc;

use crate::connection::{ConnectionId, Connections, Outbox};
use crate::registry::{SessionRegistry, Teardown};
use crate::session::SessionId;

/// Events sent from connection tasks to the relay loop
#[derive(Debug)]
pub enum RelayEvent {
    Connected {
        id: ConnectionId,
        addr: SocketAddr,
        outbox: Outbox,
    },
    Frame {
        id: ConnectionId,
        text: String,
    },
    Disconnected {
        id: ConnectionId,
    },
    Shutdown,
}

pub struct Relay {
    registry: SessionRegistry,
    connections: Connections,
}

impl Relay {
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            connections: Connections::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Applies one event. Returns false once the loop should stop.
    pub fn handle_event(&mut self, event: RelayEvent) -> bool {
        match event {
            RelayEvent::Connected { id, addr, outbox } => {
                self.connections.insert(id, addr, outbox);
            }
            RelayEvent::Frame { id, text } => self.handle_frame(id, &text),
            RelayEvent::Disconnected { id } => self.disconnect(id),
            RelayEvent::Shutdown => return false,
        }
        true
    }

    fn handle_frame(&mut self, id: ConnectionId, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(message) => self.handle_message(id, message),
            Err(e) => {
                warn!("Rejecting frame from connection {}: {}", id, e);
                self.deliver(id, ServerMessage::error(&e));
            }
        }
    }

    fn handle_message(&mut self, id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::CreateSession {
                player_name,
                player_avatar,
            } => self.create_session(id, PlayerInfo::new(player_name, player_avatar)),
            ClientMessage::JoinSession {
                invite_code,
                player_name,
                player_avatar,
            } => self.join_session(id, &invite_code, PlayerInfo::new(player_name, player_avatar)),
            ClientMessage::GameMessage { session_id, data } => {
                if let Err(e) = self.relay(id, session_id, data) {
                    debug!(
                        "Dropped game message from connection {} for session {}: {}",
                        id, session_id, e
                    );
                }
            }
            ClientMessage::Ping => self.deliver(id, ServerMessage::Pong),
        }
    }

    fn create_session(&mut self, host: ConnectionId, host_info: PlayerInfo) {
        match self.registry.create_session(host, host_info) {
            Ok(created) => {
                if let Some(teardown) = created.replaced {
                    self.notify_teardown(teardown);
                }
                self.deliver(
                    host,
                    ServerMessage::SessionCreated {
                        session_id: created.session_id,
                        invite_code: created.invite_code,
                    },
                );
            }
            Err(e) => {
                warn!("Connection {} could not create a session: {}", host, e);
                self.deliver(host, ServerMessage::error(&e));
            }
        }
    }

    fn join_session(&mut self, guest: ConnectionId, invite_code: &str, guest_info: PlayerInfo) {
        let joined = match self.registry.join_session(guest, invite_code, guest_info) {
            Ok(joined) => joined,
            Err(e) => {
                info!(
                    "Connection {} failed to join {:?}: {}",
                    guest, invite_code, e
                );
                self.deliver(guest, ServerMessage::error(&e));
                return;
            }
        };

        if let Some(teardown) = joined.replaced {
            self.notify_teardown(teardown);
        }

        let session_id = joined.session_id;
        self.deliver(
            joined.host,
            ServerMessage::PlayerJoined {
                guest_info: joined.guest_info,
            },
        );
        self.deliver(
            guest,
            ServerMessage::SessionJoined {
                session_id,
                host_info: joined.host_info,
            },
        );
        self.deliver(joined.host, ServerMessage::GameReady { session_id });
        self.deliver(guest, ServerMessage::GameReady { session_id });
    }

    /// Forwards an opaque game payload to the sender's counterpart.
    ///
    /// The payload is delivered unmodified and at most once. Nothing is sent
    /// back to the sender on failure.
    pub fn relay(
        &mut self,
        from: ConnectionId,
        session_id: SessionId,
        payload: Value,
    ) -> Result<(), RelayError> {
        let target = self.registry.counterpart(session_id, from)?;
        self.connections.send(
            target,
            ServerMessage::GameMessage {
                session_id,
                data: payload,
            },
        )
    }

    fn disconnect(&mut self, id: ConnectionId) {
        if let Some(teardown) = self.registry.teardown(id) {
            self.notify_teardown(teardown);
        }
        self.connections.remove(id);
    }

    fn notify_teardown(&self, teardown: Teardown) {
        if let Some(survivor) = teardown.survivor {
            self.deliver(
                survivor,
                ServerMessage::PlayerDisconnected {
                    session_id: teardown.session_id,
                },
            );
        }
    }

    fn deliver(&self, id: ConnectionId, message: ServerMessage) {
        if let Err(e) = self.connections.send(id, message) {
            debug!("Could not deliver to connection {}: {}", id, e);
        }
    }

    /// Runs until every sender is gone or a shutdown event arrives.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<RelayEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        info!(
            "Relay stopped with {} sessions and {} connections",
            self.registry.len(),
            self.connections.len()
        );
    }
}
