//! Periodic keep-alive envelopes per connection.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use quotegate_rpc::types::JsonRpcNotification;

use super::connection::SseConnection;
use super::registry::ConnectionRegistry;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The heartbeat was cancelled externally (connection closed, shutdown).
    Cancelled,
    /// The connection was no longer in the registry at tick time.
    Deregistered,
    /// A heartbeat write failed; the connection was removed.
    WriteFailed,
}

/// Send a heartbeat envelope to one connection every `interval`.
///
/// Started once per connection at registration time. If the connection has
/// already been removed from the registry when a tick fires, the loop stops
/// without writing. A write failure removes the connection through the same
/// registry path the broadcaster uses, then stops.
pub async fn run_heartbeat(
    registry: Arc<ConnectionRegistry>,
    connection: Arc<SseConnection>,
    interval: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    // First tick fires one full interval after open, not immediately.
    let mut ticker = time::interval_at(Instant::now() + interval, interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if registry.get(&connection.id).is_none() {
                    debug!(conn_id = %connection.id, "connection gone, stopping heartbeat");
                    return HeartbeatResult::Deregistered;
                }
                if connection.send_envelope(&JsonRpcNotification::heartbeat()) {
                    counter!(crate::metrics::HEARTBEATS_SENT_TOTAL).increment(1);
                } else {
                    warn!(conn_id = %connection.id, "heartbeat write failed, removing connection");
                    let _ = registry.remove(&connection.id);
                    return HeartbeatResult::WriteFailed;
                }
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
        }
    }
}
