//! Session registry for the relay server
//!
//! This module owns every live session and the indexes used to reach it:
//! - Session id → session
//! - Invite code → session id, for guests joining by code
//! - Connection → session id, for relaying and teardown on disconnect
//!
//! The registry is plain data. It decides who must be notified but never
//! sends anything itself; the relay turns its answers into messages.

use log::{info, warn};
use shared::{invite_code_for, normalize_invite_code, PlayerInfo, RelayError};
use std::collections::HashMap;
use uuid::Uuid;

use crate::connection::ConnectionId;
use crate::session::{Session, SessionId, SessionState};

/// Attempts at finding an unused invite code before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;

/// A session that was just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub invite_code: String,
    /// The host's previous session, torn down to make room for this one.
    pub replaced: Option<Teardown>,
}

/// A guest that was just seated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub session_id: SessionId,
    pub host: ConnectionId,
    pub host_info: PlayerInfo,
    pub guest_info: PlayerInfo,
    /// The guest's previous session, left when joining this one.
    pub replaced: Option<Teardown>,
}

/// A removed session and the peer that is still connected, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teardown {
    pub session_id: SessionId,
    pub invite_code: String,
    pub survivor: Option<ConnectionId>,
}

/// Tracks all live sessions.
///
/// Each connection belongs to at most one session. Creating or joining a
/// session while already in one leaves the old session first, so the most
/// recent request wins.
pub struct SessionRegistry {
    /// Live sessions by id
    sessions: HashMap<SessionId, Session>,
    /// Invite code to session id
    by_code: HashMap<String, SessionId>,
    /// Session each member connection belongs to
    by_connection: HashMap<ConnectionId, SessionId>,
    /// Maximum number of live sessions
    max_sessions: usize,
    /// Generator for new session ids
    id_source: Box<dyn FnMut() -> Uuid + Send>,
}

impl SessionRegistry {
    /// Creates an empty registry holding at most `max_sessions` sessions.
    pub fn new(max_sessions: usize) -> Self {
        Self::with_id_source(max_sessions, Uuid::new_v4)
    }

    /// Creates a registry that draws session ids from `id_source`.
    pub fn with_id_source<F>(max_sessions: usize, id_source: F) -> Self
    where
        F: FnMut() -> Uuid + Send + 'static,
    {
        Self {
            sessions: HashMap::new(),
            by_code: HashMap::new(),
            by_connection: HashMap::new(),
            max_sessions,
            id_source: Box::new(id_source),
        }
    }

    /// Opens a new waiting session hosted by `host`.
    ///
    /// A fresh id is drawn until its invite code is unused among live
    /// sessions. Fails with `ServerFull` when the capacity is reached or no
    /// free code turns up. A failed create leaves the host's current session
    /// in place.
    pub fn create_session(
        &mut self,
        host: ConnectionId,
        host_info: PlayerInfo,
    ) -> Result<CreatedSession, RelayError> {
        let own_session = usize::from(self.by_connection.contains_key(&host));
        if self.sessions.len() - own_session >= self.max_sessions {
            return Err(RelayError::ServerFull);
        }

        let (session_id, invite_code) = self.allocate_id()?;
        let replaced = self.teardown(host);

        let session = Session::new(session_id, invite_code.clone(), host, host_info);
        self.sessions.insert(session_id, session);
        self.by_code.insert(invite_code.clone(), session_id);
        self.by_connection.insert(host, session_id);

        info!("Session {} created by connection {}", invite_code, host);
        Ok(CreatedSession {
            session_id,
            invite_code,
            replaced,
        })
    }

    fn allocate_id(&mut self) -> Result<(SessionId, String), RelayError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let session_id = (self.id_source)();
            let invite_code = invite_code_for(&session_id);
            if !self.by_code.contains_key(&invite_code) && !self.sessions.contains_key(&session_id)
            {
                return Ok((session_id, invite_code));
            }
            warn!("Invite code {} is already live, drawing another", invite_code);
        }
        Err(RelayError::ServerFull)
    }

    /// Seats `guest` in the waiting session behind `invite_code`.
    ///
    /// A failed join leaves the registry untouched.
    pub fn join_session(
        &mut self,
        guest: ConnectionId,
        invite_code: &str,
        guest_info: PlayerInfo,
    ) -> Result<JoinedSession, RelayError> {
        let invite_code = normalize_invite_code(invite_code);
        let session_id = *self
            .by_code
            .get(&invite_code)
            .ok_or(RelayError::SessionNotFound)?;
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(RelayError::SessionNotFound)?;

        if session.host == guest {
            return Err(RelayError::OwnSession);
        }
        if session.guest.is_some() {
            return Err(RelayError::SessionFull);
        }

        let replaced = self.teardown(guest);
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(RelayError::SessionNotFound)?;
        session.attach_guest(guest, guest_info.clone());
        self.by_connection.insert(guest, session_id);

        info!(
            "Connection {} joined session {} hosted by {}",
            guest, invite_code, session.host
        );
        Ok(JoinedSession {
            session_id,
            host: session.host,
            host_info: session.host_info.clone(),
            guest_info,
            replaced,
        })
    }

    /// Removes the session `connection` belongs to.
    ///
    /// Returns `None` if the connection is not in a session, which makes a
    /// second teardown for the same disconnect a no-op.
    pub fn teardown(&mut self, connection: ConnectionId) -> Option<Teardown> {
        let session_id = self.by_connection.remove(&connection)?;
        let session = self.sessions.remove(&session_id)?;
        self.by_code.remove(&session.invite_code);

        let survivor = session.counterpart(connection);
        if let Some(survivor) = survivor {
            self.by_connection.remove(&survivor);
        }

        info!(
            "Session {} removed after connection {} left",
            session.invite_code, connection
        );
        Some(Teardown {
            session_id,
            invite_code: session.invite_code,
            survivor,
        })
    }

    /// Finds where a relayed payload from `from` must go.
    pub fn counterpart(
        &self,
        session_id: SessionId,
        from: ConnectionId,
    ) -> Result<ConnectionId, RelayError> {
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(RelayError::SessionNotFound)?;
        if session.state != SessionState::Ready {
            return Err(RelayError::PeerUnavailable);
        }
        session
            .counterpart(from)
            .ok_or(RelayError::PeerUnavailable)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn find_by_code(&self, invite_code: &str) -> Option<&Session> {
        self.by_code
            .get(&normalize_invite_code(invite_code))
            .and_then(|id| self.sessions.get(id))
    }

    pub fn session_of(&self, connection: ConnectionId) -> Option<SessionId> {
        self.by_connection.get(&connection).copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
