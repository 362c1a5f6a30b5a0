use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ChannelError;
use crate::models::websocket::{parse_frame, InboundFrame, UpdateEvent};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Closed,
    Shutdown,
}

pub fn endpoint_url(base_url: &str, poll_id: i64, credential: &str) -> String {
    format!(
        "{}/ws/polls/{}?token={}",
        base_url.trim_end_matches('/'),
        poll_id,
        urlencoding::encode(credential)
    )
}

pub async fn open(url: &str) -> Result<WsStream, ChannelError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    Ok(ws_stream)
}

pub fn decode(text: &str) -> Result<InboundFrame, ChannelError> {
    Ok(parse_frame(text)?)
}

pub async fn run_session<F>(
    ws_stream: WsStream,
    mut outbound: UnboundedReceiver<Message>,
    shutdown: &mut oneshot::Receiver<()>,
    mut on_update: F,
) -> SessionEnd
where
    F: FnMut(UpdateEvent),
{
    let (mut sink, mut stream) = ws_stream.split();

    let end = loop {
        tokio::select! {
            biased;

            _ = &mut *shutdown => {
                info!("WebSocket shutdown requested");
                break SessionEnd::Shutdown;
            }

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_text(text.as_str(), &mut on_update),
                Some(Ok(Message::Close(frame))) => {
                    info!("WebSocket closed by server: {:?}", frame);
                    break SessionEnd::Closed;
                }
                Some(Ok(Message::Binary(data))) => {
                    warn!("Received invalid message: {} byte binary frame", data.len());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break SessionEnd::Closed;
                }
                None => {
                    info!("WebSocket stream ended");
                    break SessionEnd::Closed;
                }
            },

            Some(frame) = outbound.recv() => {
                if let Err(e) = sink.send(frame).await {
                    error!("Failed to send frame: {}", e);
                    break SessionEnd::Closed;
                }
            }
        }
    };

    sink.close().await.ok();
    end
}

fn handle_text<F>(text: &str, on_update: &mut F)
where
    F: FnMut(UpdateEvent),
{
    match decode(text) {
        Ok(InboundFrame::HeartbeatAck) => {}
        Ok(InboundFrame::Update(event)) => {
            debug!("Received {} for poll {}", event.kind(), event.poll().id);
            on_update(event);
        }
        Ok(InboundFrame::Ignored(kind)) => debug!("Ignoring message of type {}", kind),
        Err(e) => warn!("Received invalid message: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::poll::sample_poll;

    #[test]
    fn endpoint_carries_poll_and_token() {
        assert_eq!(
            endpoint_url("ws://localhost:8000", 42, "abc.def"),
            "ws://localhost:8000/ws/polls/42?token=abc.def"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_and_escapes_token() {
        assert_eq!(
            endpoint_url("wss://polls.example.com/", 1, "a+b/c="),
            "wss://polls.example.com/ws/polls/1?token=a%2Bb%2Fc%3D"
        );
    }

    #[test]
    fn only_updates_reach_the_callback() {
        let mut seen = Vec::new();
        let poll = sample_poll(5, &[1, 1]);
        let update = serde_json::json!({ "type": "like_update", "data": poll }).to_string();

        for text in ["pong", "garbage", r#"{"type":"other"}"#, update.as_str()] {
            handle_text(text, &mut |event: UpdateEvent| seen.push(event));
        }

        assert_eq!(seen, vec![UpdateEvent::LikeUpdate(poll)]);
    }
}
