use shared::{BoardError, RelayError};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures that end a client run.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(#[from] tungstenite::Error),
    #[error("invalid board: {0}")]
    Board(#[from] BoardError),
    #[error("protocol error: {0}")]
    Protocol(#[from] RelayError),
    #[error("server refused: {0}")]
    Rejected(String),
    #[error("connection to the server is closed")]
    Closed,
}
