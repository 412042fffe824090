use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::subscription::{self, WatchKind};

/// Relays group snapshots over a WebSocket: every delivery from the
/// subscription (push or poll) is sent to the client as one JSON text
/// frame holding the full snapshot. Returns when the client goes away,
/// cancelling the subscription with it.
pub async fn serve_snapshots<T, F>(
    socket: WebSocket,
    dispatcher: Dispatcher,
    group_code: String,
    kind: WatchKind,
    poll_interval: Duration,
    fetch: F,
) where
    T: Serialize + Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let guard = subscription::watch(&dispatcher, &group_code, kind, poll_interval, fetch, move |snapshot| {
        let _ = tx.send(snapshot);
    });

    info!("snapshot stream opened for group {} ({:?})", group_code, kind);

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let text = match serde_json::to_string(&snapshot) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("failed to serialize snapshot for {}: {}", group_code, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by axum; other client frames are ignored
                    _ => {}
                }
            }
        }
    }

    guard.cancel();
    info!("snapshot stream closed for group {}", group_code);
}
