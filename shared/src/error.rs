use thiserror::Error;

/// Failures of the session relay. The display strings are what the server
/// sends back to a client inside an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("Session full")]
    SessionFull,
    #[error("Cannot join your own session")]
    OwnSession,
    #[error("Server full")]
    ServerFull,
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
    /// The relay target is gone. Never reported to the sender.
    #[error("Peer unavailable")]
    PeerUnavailable,
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedMessage(err.to_string())
    }
}
