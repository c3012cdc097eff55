//! Open-connection index.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::{counter, gauge};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::connection::SseConnection;

/// Tracks currently-open stream connections by identifier.
///
/// Identifiers are freshly generated UUIDs, never reused while present.
/// Removal is idempotent so a close signal and a failed write can race
/// without double-counting.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<SseConnection>>>,
    active_count: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a new connection over `tx`, returning it with a fresh id.
    pub fn register(&self, tx: mpsc::Sender<Arc<String>>) -> Arc<SseConnection> {
        let id = format!("conn_{}", Uuid::now_v7());
        let conn = Arc::new(SseConnection::new(id.clone(), tx));
        {
            let mut conns = self.connections.write();
            let _ = conns.insert(id.clone(), Arc::clone(&conn));
        }
        let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        counter!(crate::metrics::SSE_CONNECTIONS_TOTAL).increment(1);
        gauge!(crate::metrics::SSE_CONNECTIONS_ACTIVE).increment(1.0);
        info!(conn_id = id, "connection registered");
        conn
    }

    /// Remove a connection. Returns `true` only for the call that actually
    /// removed it; removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.connections.write().remove(id).is_some();
        if removed {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
            counter!(crate::metrics::SSE_DISCONNECTIONS_TOTAL).increment(1);
            gauge!(crate::metrics::SSE_CONNECTIONS_ACTIVE).decrement(1.0);
            debug!(conn_id = id, "connection removed");
        }
        removed
    }

    /// Look up a connection by id.
    pub fn get(&self, id: &str) -> Option<Arc<SseConnection>> {
        self.connections.read().get(id).cloned()
    }

    /// Stable snapshot of all open connections for iteration.
    pub fn snapshot(&self) -> Vec<Arc<SseConnection>> {
        self.connections.read().values().cloned().collect()
    }

    /// Number of open connections (no locking).
    pub fn count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
