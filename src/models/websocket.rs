use serde::{Deserialize, Serialize};

use super::poll::Poll;

/// Text frame sent by the client to keep the connection alive.
pub const HEARTBEAT: &str = "ping";
/// Server acknowledgement of a heartbeat.
pub const HEARTBEAT_ACK: &str = "pong";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum UpdateEvent {
    VoteUpdate(Poll),
    LikeUpdate(Poll),
}

impl UpdateEvent {
    pub fn poll(&self) -> &Poll {
        match self {
            UpdateEvent::VoteUpdate(poll) | UpdateEvent::LikeUpdate(poll) => poll,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpdateEvent::VoteUpdate(_) => "vote_update",
            UpdateEvent::LikeUpdate(_) => "like_update",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InboundFrame {
    HeartbeatAck,
    Update(UpdateEvent),
    /// Well-formed message with a type this client does not handle.
    Ignored(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

pub fn parse_frame(text: &str) -> Result<InboundFrame, serde_json::Error> {
    if text == HEARTBEAT_ACK {
        return Ok(InboundFrame::HeartbeatAck);
    }

    let envelope: Envelope = serde_json::from_str(text)?;
    let frame = match envelope.kind.as_str() {
        "vote_update" => InboundFrame::Update(UpdateEvent::VoteUpdate(serde_json::from_value(
            envelope.data,
        )?)),
        "like_update" => InboundFrame::Update(UpdateEvent::LikeUpdate(serde_json::from_value(
            envelope.data,
        )?)),
        _ => InboundFrame::Ignored(envelope.kind),
    };
    Ok(frame)
}
