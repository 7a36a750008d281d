// WebSocket listener for game-write trigger frames.
//
// Each text frame carries one JSON-encoded game write event. Several writers
// may be connected at once; every connection gets its own task and all of
// them feed the same channel.

use futures_util::stream::Stream;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Events emitted by trigger sources to the application loop.
#[derive(Debug, PartialEq)]
pub enum TriggerEvent {
    Connected { addr: String },
    Disconnected { addr: String },
    /// Raw JSON text of one game write event.
    Message(String),
}

/// The application loop dropped its receiver.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("trigger channel closed")]
pub struct ChannelClosed;

/// Accept connections on `127.0.0.1:{port}` until the receiver goes away.
pub async fn run(port: u16, tx: mpsc::Sender<TriggerEvent>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    info!("trigger listener on {}", listener.local_addr()?);

    while !tx.is_closed() {
        let (stream, addr) = listener.accept().await?;
        info!("accepted TCP connection from {addr}");
        tokio::spawn(serve_connection(stream, addr.to_string(), tx.clone()));
    }

    info!("trigger channel closed; listener stopping");
    Ok(())
}

async fn serve_connection(stream: TcpStream, addr: String, tx: mpsc::Sender<TriggerEvent>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    if tx
        .send(TriggerEvent::Connected { addr: addr.clone() })
        .await
        .is_err()
    {
        return;
    }

    let (_write, read) = ws.split();
    match forward_frames(read, &tx, &addr).await {
        Ok(count) => {
            debug!("{addr} delivered {count} frames");
            let _ = tx.send(TriggerEvent::Disconnected { addr }).await;
        }
        Err(closed) => debug!("dropping connection from {addr}: {closed}"),
    }
}

/// Forward text frames from `stream` until it ends, closes, or errors.
/// Returns the number of frames forwarded.
pub async fn forward_frames<St>(
    mut stream: St,
    tx: &mpsc::Sender<TriggerEvent>,
    addr: &str,
) -> Result<usize, ChannelClosed>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut forwarded = 0;
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                tx.send(TriggerEvent::Message(text.to_string()))
                    .await
                    .map_err(|_| ChannelClosed)?;
                forwarded += 1;
            }
            Ok(Message::Close(_)) => {
                info!("{addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            Ok(other) => debug!("ignoring non-text frame from {addr} ({} bytes)", other.len()),
        }
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn frames(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    #[tokio::test]
    async fn text_frames_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let messages = vec![
            Ok(Message::Text(r#"{"game_id":"g1"}"#.into())),
            Ok(Message::Text(r#"{"game_id":"g2"}"#.into())),
        ];

        let count = forward_frames(frames(messages), &tx, "test").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            rx.recv().await.unwrap(),
            TriggerEvent::Message(r#"{"game_id":"g1"}"#.into())
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            TriggerEvent::Message(r#"{"game_id":"g2"}"#.into())
        );
    }

    #[tokio::test]
    async fn close_frame_ends_the_connection() {
        let (tx, mut rx) = mpsc::channel(8);
        let messages = vec![
            Ok(Message::Text("first".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("never".into())),
        ];

        let count = forward_frames(frames(messages), &tx, "test").await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(rx.recv().await.unwrap(), TriggerEvent::Message("first".into()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn socket_error_ends_the_connection() {
        let (tx, mut rx) = mpsc::channel(8);
        let messages = vec![
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("never".into())),
        ];

        assert_eq!(forward_frames(frames(messages), &tx, "test").await, Ok(0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn binary_and_ping_frames_are_skipped() {
        let (tx, mut rx) = mpsc::channel(8);
        let messages = vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            Ok(Message::Text("kept".into())),
        ];

        assert_eq!(forward_frames(frames(messages), &tx, "test").await, Ok(1));
        assert_eq!(rx.recv().await.unwrap(), TriggerEvent::Message("kept".into()));
    }

    #[tokio::test]
    async fn closed_receiver_is_reported() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let messages = vec![Ok(Message::Text("orphan".into()))];
        assert_eq!(
            forward_frames(frames(messages), &tx, "test").await,
            Err(ChannelClosed)
        );
    }
}
