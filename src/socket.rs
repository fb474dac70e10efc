//! One WebSocket link per session.
//!
//! The link runs as a single spawned task owning both halves of the stream.
//! It never touches application state: everything it learns is forwarded
//! through the app event channel, and everything it sends comes in through a
//! frame channel. Dropping the [`FrameSender`] or cancelling the token shuts
//! the link down; both paths close the sink exactly once.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::events::{AppEvent, SocketEvent};
use crate::manager::SessionId;
use crate::protocol::{ClientFrame, decode_frame};

/// Handle for queueing outbound frames onto a link.
///
/// The queue is unbounded: frames are keystroke-sized and the writer drains
/// them immediately. Once the link is gone, sends fail quietly.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<ClientFrame>,
}

impl FrameSender {
    pub fn send(&self, frame: ClientFrame) -> bool {
        self.tx.send(frame).is_ok()
    }

    /// Sender/receiver pair not backed by a real link.
    #[cfg(test)]
    pub fn test_pair() -> (Self, mpsc::UnboundedReceiver<ClientFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

/// Spawn the link task for one session.
///
/// Reports `Opened`, then decoded `Frame`s in receipt order, then exactly one
/// of `Closed`/`Failed` — unless the token is cancelled first, in which case
/// the link goes away silently (the session initiated the teardown and needs
/// no notification).
pub fn spawn_link(
    url: String,
    session: SessionId,
    event_tx: mpsc::Sender<AppEvent>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        run_link(url, session, event_tx, cancel).await;
    });
}

async fn run_link(
    url: String,
    session: SessionId,
    event_tx: mpsc::Sender<AppEvent>,
    cancel: CancellationToken,
) {
    let emit = |event: SocketEvent| {
        let event_tx = event_tx.clone();
        async move {
            let _ = event_tx.send(AppEvent::Socket { session, event }).await;
        }
    };

    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        connected = connect_async(url.as_str()) => connected,
    };
    let ws = match connected {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::error!(session, %e, "WebSocket dial failed");
            emit(SocketEvent::Failed(e.to_string())).await;
            return;
        }
    };
    tracing::info!(session, %url, "WebSocket connected");

    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    emit(SocketEvent::Opened(FrameSender { tx })).await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.close().await;
                break;
            }
            outbound = rx.recv() => match outbound {
                Some(frame) => {
                    let text = match frame.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(session, %e, "dropping unencodable frame");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::error!(session, %e, "WebSocket write failed");
                        emit(SocketEvent::Failed(e.to_string())).await;
                        break;
                    }
                }
                // Sender dropped: the session was torn down.
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(frame) = decode_frame(&text) {
                        emit(SocketEvent::Frame(frame)).await;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    // The protocol is text-only; tolerate a binary frame by
                    // running it through the same decode fallback.
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if let Some(frame) = decode_frame(&text) {
                        emit(SocketEvent::Frame(frame)).await;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    emit(SocketEvent::Closed).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(session, %e, "WebSocket read failed");
                    emit(SocketEvent::Failed(e.to_string())).await;
                    break;
                }
            },
        }
    }
}
