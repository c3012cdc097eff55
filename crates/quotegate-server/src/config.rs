//! Gateway configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the gateway server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Heartbeat period in seconds.
    pub heartbeat_interval_secs: u64,
    /// Per-connection outbound channel capacity.
    pub channel_capacity: usize,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Base URL of the upstream exchange REST API.
    pub exchange_base_url: String,
    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            heartbeat_interval_secs: 30,
            channel_capacity: 64,
            max_body_bytes: 1024 * 1024,
            exchange_base_url: "https://api.binance.com".into(),
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_heartbeat_interval_is_thirty() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval_secs, 30);
    }

    #[test]
    fn default_channel_capacity() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.channel_capacity, 64);
    }

    #[test]
    fn default_body_limit_is_one_mebibyte() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.heartbeat_interval_secs, cfg.heartbeat_interval_secs);
        assert_eq!(back.exchange_base_url, cfg.exchange_base_url);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"0.0.0.0","port":8080,"heartbeat_interval_secs":5,"channel_capacity":8,"max_body_bytes":4096,"exchange_base_url":"http://localhost:9000","request_timeout_secs":2}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.heartbeat_interval_secs, 5);
        assert_eq!(cfg.exchange_base_url, "http://localhost:9000");
    }
}
