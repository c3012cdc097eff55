//! `GET /sse` — stream-open handling.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::connection::SseConnection;
use super::heartbeat::run_heartbeat;
use super::registry::ConnectionRegistry;
use crate::server::AppState;

/// A freshly accepted stream subscription.
pub struct OpenedStream {
    /// The registered connection.
    pub connection: Arc<SseConnection>,
    /// Receive half of the connection's outbound channel.
    pub receiver: mpsc::Receiver<Arc<String>>,
    /// Cancels this connection's heartbeat task.
    pub cancel: CancellationToken,
}

/// Accept a new stream subscription.
///
/// Registers the connection, announces its identifier, and drains any
/// pending messages to it in one atomic step (see [`Broadcaster::open`]),
/// then starts its heartbeat task. A client always sees
/// `connection/established` first, buffered messages next, and live
/// broadcasts only after those.
///
/// [`Broadcaster::open`]: crate::sse::broadcast::Broadcaster::open
pub fn open_stream(state: &AppState) -> OpenedStream {
    let (tx, rx) = mpsc::channel(state.config.channel_capacity);
    let connection = state.broadcaster.open(tx);

    let cancel = state.shutdown.token().child_token();
    let _heartbeat = tokio::spawn(run_heartbeat(
        Arc::clone(&state.connections),
        Arc::clone(&connection),
        Duration::from_secs(state.config.heartbeat_interval_secs),
        cancel.clone(),
    ));

    OpenedStream {
        connection,
        receiver: rx,
        cancel,
    }
}

/// Removes the connection and cancels its heartbeat when the SSE response
/// stream is dropped. Removal is exactly-once even if a failed write or the
/// heartbeat task got there first.
struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: String,
    cancel: CancellationToken,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.registry.remove(&self.id) {
            info!(conn_id = %self.id, "stream connection closed");
        }
    }
}

/// `GET /sse` handler.
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let opened = open_stream(&state);
    info!(conn_id = %opened.connection.id, "stream connection opened");

    let guard = ConnectionGuard {
        registry: Arc::clone(&state.connections),
        id: opened.connection.id.clone(),
        cancel: opened.cancel,
    };

    let stream = ReceiverStream::new(opened.receiver).map(move |msg| {
        // The guard lives as long as the response stream.
        let _keep = &guard;
        Ok(Event::default().data(msg.as_str()))
    });

    Sse::new(stream)
}
