//! A game session brokered between a host and at most one guest.

use shared::PlayerInfo;
use std::time::Instant;
use uuid::Uuid;

use crate::connection::ConnectionId;

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created by a host, waiting for a guest to join with the invite code.
    Waiting,
    /// Both seats are taken and the game has been started.
    Ready,
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier
    pub id: SessionId,
    /// First eight characters of the id, upper-cased, shared with the guest
    pub invite_code: String,
    /// Connection that created the session
    pub host: ConnectionId,
    /// Connection seated as the second player, once joined
    pub guest: Option<ConnectionId>,
    /// Name and avatar the host announced
    pub host_info: PlayerInfo,
    /// Name and avatar the guest announced
    pub guest_info: Option<PlayerInfo>,
    /// Whether the session still waits for its guest
    pub state: SessionState,
    /// When the host created the session
    pub created_at: Instant,
}

impl Session {
    pub fn new(
        id: SessionId,
        invite_code: String,
        host: ConnectionId,
        host_info: PlayerInfo,
    ) -> Self {
        Self {
            id,
            invite_code,
            host,
            guest: None,
            host_info,
            guest_info: None,
            state: SessionState::Waiting,
            created_at: Instant::now(),
        }
    }

    /// Seats the guest and starts the game.
    pub fn attach_guest(&mut self, guest: ConnectionId, guest_info: PlayerInfo) {
        self.guest = Some(guest);
        self.guest_info = Some(guest_info);
        self.state = SessionState::Ready;
    }

    pub fn is_member(&self, connection: ConnectionId) -> bool {
        self.host == connection || self.guest == Some(connection)
    }

    /// The other side of the table, if it is seated.
    pub fn counterpart(&self, connection: ConnectionId) -> Option<ConnectionId> {
        if connection == self.host {
            self.guest
        } else if self.guest == Some(connection) {
            Some(self.host)
        } else {
            None
        }
    }
}
