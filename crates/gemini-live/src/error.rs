use std::time::Duration;
use tokio_tungstenite::tungstenite;

/// Failures while opening a session. The session is unusable and must be recreated.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid connection request: {0}")]
    Request(#[source] tungstenite::Error),
    #[error("failed to connect: {0}")]
    Transport(#[source] tungstenite::Error),
    #[error("timed out connecting after {0:?}")]
    ConnectTimeout(Duration),
    #[error("failed to send setup message: {0}")]
    Setup(#[source] SendError),
    #[error("setup was not acknowledged within {0:?}")]
    SetupTimeout(Duration),
    #[error("connection closed before setup was acknowledged")]
    ClosedDuringSetup,
}

/// Failures while writing a turn. Fatal to the turn, not necessarily to the session.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("session is closed")]
    Closed,
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write message: {0}")]
    Transport(#[from] tungstenite::Error),
}
