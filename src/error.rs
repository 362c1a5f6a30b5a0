use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("realtime channel requires a running tokio runtime")]
    NoRuntime,

    #[error("WebSocket connection failed: {0}")]
    Connect(#[from] tungstenite::Error),

    #[error("malformed realtime frame: {0}")]
    Decode(#[from] serde_json::Error),
}
