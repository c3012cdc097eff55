//! Prometheus metrics recorder and `/metrics` endpoint support.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Name constants for the metrics this crate records. The RPC and exchange
// counters live with their recording code in quotegate-rpc and
// quotegate-tools.

/// Stream connections opened total (counter).
pub const SSE_CONNECTIONS_TOTAL: &str = "sse_connections_total";
/// Stream disconnections total (counter).
pub const SSE_DISCONNECTIONS_TOTAL: &str = "sse_disconnections_total";
/// Active stream connections (gauge).
pub const SSE_CONNECTIONS_ACTIVE: &str = "sse_connections_active";
/// Broadcast write failures total (counter).
pub const BROADCAST_DROPS_TOTAL: &str = "broadcast_drops_total";
/// Messages buffered while no connection was open (gauge).
pub const PENDING_QUEUE_DEPTH: &str = "pending_queue_depth";
/// Heartbeat envelopes sent total (counter).
pub const HEARTBEATS_SENT_TOTAL: &str = "heartbeats_sent_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_and_render() {
        // Build a recorder + handle (no global install to avoid test conflicts).
        let handle = PrometheusBuilder::new().build_recorder().handle();

        let output = handle.render();
        // Empty or contains valid text — no panic.
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            SSE_CONNECTIONS_TOTAL,
            SSE_DISCONNECTIONS_TOTAL,
            SSE_CONNECTIONS_ACTIVE,
            BROADCAST_DROPS_TOTAL,
            PENDING_QUEUE_DEPTH,
            HEARTBEATS_SENT_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
