//! Per-connection output channel state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A single open stream connection.
///
/// All writes go through the connection's mpsc channel, whose sole consumer
/// is the SSE response stream. That channel is the per-connection write
/// ordering: heartbeat and broadcast writes to the same connection can never
/// interleave partially.
pub struct SseConnection {
    /// Unique connection identifier.
    pub id: String,
    /// Send half of the outbound channel.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// When the last write was accepted.
    last_write: Mutex<Instant>,
    /// Count of writes rejected because the channel was full or closed.
    pub dropped_writes: AtomicU64,
}

impl SseConnection {
    /// Create a new connection over the given sender.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            last_write: Mutex::new(now),
            dropped_writes: AtomicU64::new(0),
        }
    }

    /// Send a serialized envelope to the client.
    ///
    /// Returns `false` if the channel is full or closed, and increments the
    /// dropped-write counter.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            *self.last_write.lock() = Instant::now();
            true
        } else {
            let _ = self.dropped_writes.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize an envelope and send it.
    pub fn send_envelope<T: serde::Serialize>(&self, envelope: &T) -> bool {
        match serde_json::to_string(envelope) {
            Ok(json) => self.send(Arc::new(json)),
            Err(_) => false,
        }
    }

    /// Whether the client side of the channel is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Total rejected writes for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_writes.load(Ordering::Relaxed)
    }

    /// Duration since the last accepted write (or establishment).
    pub fn last_write_elapsed(&self) -> Duration {
        self.last_write.lock().elapsed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (SseConnection, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        (SseConnection::new("conn_1".into(), tx), rx)
    }

    #[test]
    fn create_connection() {
        let (conn, _rx) = make_connection();
        assert_eq!(conn.id, "conn_1");
        assert_eq!(conn.drop_count(), 0);
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn send_delivers_message() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send(Arc::new("hello".into())));
        let msg = rx.recv().await.unwrap();
        assert_eq!(&*msg, "hello");
    }

    #[tokio::test]
    async fn send_to_closed_channel_returns_false() {
        let (tx, rx) = mpsc::channel(32);
        let conn = SseConnection::new("conn_2".into(), tx);
        drop(rx);
        assert!(!conn.send(Arc::new("hello".into())));
        assert!(conn.is_closed());
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_channel_returns_false() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = SseConnection::new("conn_3".into(), tx);
        assert!(conn.send(Arc::new("msg1".into())));
        assert!(!conn.send(Arc::new("msg2".into())));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_envelope_serializes() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send_envelope(&serde_json::json!({"key": "value"})));
        let msg = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["key"], "value");
    }

    #[tokio::test]
    async fn writes_preserve_order() {
        let (conn, mut rx) = make_connection();
        for i in 0..5 {
            assert!(conn.send(Arc::new(format!("msg_{i}"))));
        }
        for i in 0..5 {
            let msg = rx.recv().await.unwrap();
            assert_eq!(&*msg, &format!("msg_{i}"));
        }
    }

    #[test]
    fn last_write_updates_on_success() {
        let (conn, _rx) = make_connection();
        std::thread::sleep(Duration::from_millis(10));
        assert!(conn.last_write_elapsed() >= Duration::from_millis(10));
        assert!(conn.send(Arc::new("x".into())));
        assert!(conn.last_write_elapsed() < Duration::from_millis(10));
    }

    #[test]
    fn age_increases() {
        let (conn, _rx) = make_connection();
        let a = conn.age();
        std::thread::sleep(Duration::from_millis(5));
        assert!(conn.age() > a);
    }
}
