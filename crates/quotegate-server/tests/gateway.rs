//! End-to-end tests over the gateway router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use quotegate_rpc::{ToolDescriptor, ToolError, ToolHandler, ToolRegistry};
use quotegate_server::config::ServerConfig;
use quotegate_server::server::GatewayServer;

struct PingTool;

#[async_trait]
impl ToolHandler for PingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "ping".to_string(),
            description: "Replies with pong".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, _arguments: Option<Value>) -> Result<Value, ToolError> {
        Ok(json!({ "reply": "pong" }))
    }
}

struct FlakyTool;

#[async_trait]
impl ToolHandler for FlakyTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "flaky".to_string(),
            description: "Always fails upstream".to_string(),
            input_schema: json!({ "type": "object" }),
        }
    }

    async fn call(&self, _arguments: Option<Value>) -> Result<Value, ToolError> {
        Err(ToolError::Upstream("exchange unreachable".to_string()))
    }
}

fn make_app() -> Router {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(PingTool)).unwrap();
    tools.register(Arc::new(FlakyTool)).unwrap();
    GatewayServer::new(ServerConfig::default(), tools).router()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn ping_via_messages_endpoint() {
    let app = make_app();
    let req = post_json(
        "/messages",
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": "ping" }
        }),
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed = body_json(resp).await;
    assert_eq!(parsed["id"], 7);
    assert_eq!(parsed["result"]["reply"], "pong");
    assert!(parsed.get("error").is_none());
}

#[tokio::test]
async fn message_id_zero_and_empty_string_echo_exactly() {
    for id in [json!(0), json!("")] {
        let app = make_app();
        let req = post_json(
            "/messages",
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": { "name": "ping" }
            }),
        );
        let resp = app.oneshot(req).await.unwrap();
        let parsed = body_json(resp).await;
        assert_eq!(parsed["id"], id);
    }
}

#[tokio::test]
async fn unknown_method_via_messages_is_200_with_error_envelope() {
    let app = make_app();
    let req = post_json(
        "/messages",
        json!({ "jsonrpc": "2.0", "id": 1, "method": "no/such/method" }),
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed = body_json(resp).await;
    assert_eq!(parsed["id"], 1);
    assert_eq!(parsed["error"]["code"], -32601);
}

#[tokio::test]
async fn malformed_body_via_messages_is_400_parse_error() {
    let app = make_app();
    let req = Request::builder()
        .method("POST")
        .uri("/messages")
        .body(Body::from("not json at all"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let parsed = body_json(resp).await;
    assert!(parsed["id"].is_null());
    assert_eq!(parsed["error"]["code"], -32700);
}

#[tokio::test]
async fn ping_via_direct_tool_call() {
    let app = make_app();
    let req = post_json("/tools/call", json!({ "id": 42, "name": "ping" }));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed = body_json(resp).await;
    assert_eq!(parsed["id"], 42);
    assert_eq!(parsed["result"]["reply"], "pong");
}

#[tokio::test]
async fn unknown_tool_via_direct_call_is_404() {
    let app = make_app();
    let req = post_json("/tools/call", json!({ "name": "does_not_exist" }));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let parsed = body_json(resp).await;
    assert!(parsed["id"].is_null());
    assert_eq!(parsed["error"]["code"], -32601);
}

#[tokio::test]
async fn failing_tool_via_direct_call_is_500() {
    let app = make_app();
    let req = post_json("/tools/call", json!({ "id": "req-9", "name": "flaky" }));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let parsed = body_json(resp).await;
    assert_eq!(parsed["id"], "req-9");
    assert_eq!(parsed["error"]["code"], -32000);
    assert!(
        parsed["error"]["message"]
            .as_str()
            .unwrap()
            .contains("exchange unreachable")
    );
}

#[tokio::test]
async fn tools_listing_preserves_registration_order() {
    let app = make_app();
    let resp = app
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed = body_json(resp).await;
    let names: Vec<&str> = parsed["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ping", "flaky"]);
}

#[tokio::test]
async fn tools_list_via_messages_matches_discovery_endpoint() {
    let app = make_app();
    let req = post_json(
        "/messages",
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/list" }),
    );
    let resp = app.oneshot(req).await.unwrap();
    let parsed = body_json(resp).await;
    assert_eq!(parsed["id"], 3);
    assert_eq!(parsed["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_reports_pending_after_broadcast() {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(PingTool)).unwrap();
    let server = GatewayServer::new(ServerConfig::default(), tools);
    let app = server.router();

    let resp = app
        .clone()
        .oneshot(post_json("/broadcast", json!({ "note": "queued" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let parsed = body_json(resp).await;
    assert_eq!(parsed["pending_messages"], 1);
    assert_eq!(parsed["connections"], 0);
}

#[tokio::test]
async fn cors_preflight_on_tool_call() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/tools/call")
                .header("origin", "http://localhost:5173")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}
