//! Fan-out to open connections, with FIFO buffering while none are open.

use std::collections::VecDeque;
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use quotegate_rpc::types::{self, JsonRpcNotification};

use super::connection::SseConnection;
use super::registry::ConnectionRegistry;

/// Delivers outbound envelopes to every open connection, or buffers them
/// in FIFO order while zero connections are open.
///
/// Broadcasting is fire-and-forget: a write failure removes the affected
/// connection from the registry and is never surfaced to the sender. The
/// pending queue is shared and drain-once — the first connection to open
/// consumes it; there is no per-client replay.
///
/// The pending-queue lock serializes [`Broadcaster::open`] against
/// [`Broadcaster::send`]: a broadcast either lands in the queue before a
/// concurrent open drains it, or fans out after that open has registered,
/// announced, and drained. Neither path ever awaits while holding the lock.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    pending: Mutex<VecDeque<Arc<String>>>,
}

impl Broadcaster {
    /// Create a broadcaster over the given connection registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Broadcast a message at severity `info`.
    ///
    /// Accepts either an already well-formed envelope or a raw payload;
    /// raw payloads are wrapped into a `message` notification first.
    pub fn send(&self, message: Value) {
        self.send_with_level("info", message);
    }

    /// Broadcast a message with an explicit severity level.
    pub fn send_with_level(&self, level: &str, message: Value) {
        let envelope = if types::is_envelope(&message) {
            message
        } else {
            match serde_json::to_value(JsonRpcNotification::message(level, message)) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "failed to build notification envelope");
                    return;
                }
            }
        };
        let json = match serde_json::to_string(&envelope) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(error = %e, "failed to serialize envelope");
                return;
            }
        };

        // The lock is held across snapshot and fan-out so an in-progress
        // open (register → announce → drain) cannot interleave.
        let mut queue = self.pending.lock();
        let connections = self.registry.snapshot();
        if connections.is_empty() {
            queue.push_back(json);
            let depth = queue.len();
            gauge!(crate::metrics::PENDING_QUEUE_DEPTH).set(depth as f64);
            debug!(depth, "no open connections, message buffered");
            return;
        }

        for conn in connections {
            if !conn.send(Arc::clone(&json)) {
                counter!(crate::metrics::BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, "write failed during broadcast, removing connection");
                let _ = self.registry.remove(&conn.id);
            }
        }
    }

    /// Open a new connection: register it, announce its identifier, and
    /// drain the pending queue to it, atomically with respect to
    /// [`Broadcaster::send`].
    ///
    /// The pending-queue lock is held across all three steps, so a
    /// concurrent broadcast can never reach the connection before the
    /// announce envelope or ahead of buffered messages.
    pub fn open(&self, tx: mpsc::Sender<Arc<String>>) -> Arc<SseConnection> {
        let mut queue = self.pending.lock();
        let conn = self.registry.register(tx);

        if !conn.send_envelope(&JsonRpcNotification::connection_established(&conn.id)) {
            warn!(conn_id = %conn.id, "announce write failed, removing connection");
            let _ = self.registry.remove(&conn.id);
            return conn;
        }

        self.drain_into(&mut queue, &conn);
        gauge!(crate::metrics::PENDING_QUEUE_DEPTH).set(queue.len() as f64);
        conn
    }

    /// Drain the pending queue to a newly-opened connection, oldest first.
    ///
    /// Entries are removed only after a successful hand-off. A write failure
    /// stops the drain (the connection is dead and gets removed); whatever
    /// remains in the queue stays for the next connection to open.
    fn drain_into(&self, queue: &mut VecDeque<Arc<String>>, conn: &SseConnection) {
        let mut delivered = 0usize;
        while let Some(msg) = queue.front() {
            if conn.send(Arc::clone(msg)) {
                let _ = queue.pop_front();
                delivered += 1;
            } else {
                counter!(crate::metrics::BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, "write failed during drain, removing connection");
                let _ = self.registry.remove(&conn.id);
                break;
            }
        }
        if delivered > 0 {
            debug!(conn_id = %conn.id, delivered, "pending queue drained");
        }
    }

    /// Number of buffered messages awaiting delivery.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}
