//! HTTP transport implementation.
//!
//! Two MCP surfaces share one JSON-RPC dispatcher:
//!
//! - `POST /mcp`: single request, the JSON-RPC response is the HTTP body.
//! - `GET /sse`: opens an event stream whose first `endpoint` event names
//!   the URL (`/sse/message?sessionId=...`) the client posts its messages
//!   to. Responses are pushed back on the stream as `message` events.
//!
//! Every other path answers `404 Not found`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{StreamExt, stream};
use rmcp::ErrorData as McpError;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::server::SERVER_INSTRUCTIONS;

/// Single-request endpoint.
pub const MCP_PATH: &str = "/mcp";

/// Streaming endpoint.
pub const SSE_PATH: &str = "/sse";

/// Companion path receiving messages for a streaming session.
pub const SSE_MESSAGE_PATH: &str = "/sse/message";

/// Protocol versions this server can speak, oldest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Version answered when the client asks for one we do not know.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Buffered responses per streaming session.
const SESSION_CHANNEL_CAPACITY: usize = 32;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Convert an MCP protocol error.
    pub fn from_mcp_error(id: Option<serde_json::Value>, err: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code.0,
                message: err.message.into_owned(),
                data: err.data,
            }),
        }
    }

    /// Parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::error(None, -32700, msg)
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

type SessionMap = Arc<RwLock<HashMap<String, mpsc::Sender<JsonRpcResponse>>>>;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Open streaming sessions, keyed by session id.
    sessions: SessionMap,
}

impl AppState {
    fn new(server: McpServer) -> Self {
        Self {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Removes its session from the table when the event stream is dropped,
/// which happens when the client disconnects.
struct SessionGuard {
    id: String,
    sessions: SessionMap,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = std::mem::take(&mut self.id);
        let sessions = self.sessions.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.write().await.remove(&id);
                info!("SSE session {} closed", id);
            });
        }
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = build_router(server, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Request/response: POST {}", MCP_PATH);
        info!("  → Streaming:        GET {} + POST {}", SSE_PATH, SSE_MESSAGE_PATH);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the HTTP router serving both MCP endpoints.
pub fn build_router(server: McpServer, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route(MCP_PATH, post(handle_mcp))
        .route(SSE_PATH, get(handle_sse))
        .route(SSE_MESSAGE_PATH, post(handle_sse_message))
        .fallback(not_found)
        .with_state(AppState::new(server));

    // Add CORS if enabled
    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

// ============================================================================
// Endpoints
// ============================================================================

/// `POST /mcp`: one JSON-RPC message in, one response out.
#[instrument(skip_all)]
async fn handle_mcp(State(state): State<AppState>, body: String) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    match process_request(&state.server, request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// `GET /sse`: open a streaming session.
#[instrument(skip_all)]
async fn handle_sse(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
    state.sessions.write().await.insert(session_id.clone(), tx);
    info!("SSE session {} opened", session_id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", SSE_MESSAGE_PATH, session_id));

    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };

    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|response| (Ok::<Event, Infallible>(message_event(&response)), (rx, guard)))
    });

    let events = stream::once(async move { Ok::<Event, Infallible>(endpoint) }).chain(messages);

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// `POST /sse/message?sessionId=...`: accept a message for a streaming session.
#[instrument(skip_all)]
async fn handle_sse_message(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId").into_response();
    };

    let sender = state.sessions.read().await.get(&session_id).cloned();
    let Some(sender) = sender else {
        warn!("Message for unknown SSE session {}", session_id);
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    if let Some(response) = process_request(&state.server, request).await {
        if sender.send(response).await.is_err() {
            warn!("SSE session {} closed before the response was sent", session_id);
            state.sessions.write().await.remove(&session_id);
            return (StatusCode::NOT_FOUND, "Session not found").into_response();
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

fn message_event(response: &JsonRpcResponse) -> Event {
    match serde_json::to_string(response) {
        Ok(json) => Event::default().event("message").data(json),
        Err(e) => {
            warn!("Failed to encode JSON-RPC response: {}", e);
            Event::default().comment("failed to encode response")
        }
    }
}

// ============================================================================
// JSON-RPC dispatch
// ============================================================================

/// Malformed JSON is a parse error (-32700); valid JSON that is not a
/// request object is an invalid request (-32600).
fn parse_request(body: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        warn!("Rejected malformed JSON-RPC message: {}", e);
        JsonRpcResponse::parse_error(format!("Parse error: {}", e))
    })?;

    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| {
        warn!("Rejected invalid JSON-RPC request: {}", e);
        JsonRpcResponse::invalid_request(id)
    })
}

/// Process a JSON-RPC request. Returns `None` for notifications.
async fn process_request(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    info!("Received JSON-RPC request: {}", request.method);

    match request.method.as_str() {
        "initialize" => Some(handle_initialize(server, request)),
        "ping" => Some(JsonRpcResponse::success(request.id, serde_json::json!({}))),
        "tools/list" => Some(handle_tools_list(server, request)),
        "tools/call" => Some(handle_tools_call(server, request).await),
        method if method.starts_with("notifications/") => {
            debug!("Received notification: {}", method);
            None
        }
        _ => {
            warn!("Unknown method: {}", request.method);
            Some(JsonRpcResponse::method_not_found(request.id))
        }
    }
}

/// Handle initialize request.
fn handle_initialize(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let requested = request
        .params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str());

    let protocol_version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(LATEST_PROTOCOL_VERSION);

    let result = serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": server.name(),
            "version": server.version()
        },
        "instructions": SERVER_INSTRUCTIONS
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    match serde_json::to_value(server.list_tools()) {
        Ok(tools) => JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools })),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

/// Handle tools/call request.
async fn handle_tools_call(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest { id, params, .. } = request;

    let Some(params) = params else {
        return JsonRpcResponse::invalid_params(id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::invalid_params(id, "Missing tool name");
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    match server.call_tool(name, arguments).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::from_mcp_error(id, e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(McpServer::new(Config::default()).unwrap(), true)
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn post(app: &Router, uri: &str, body: String) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn rpc(app: &Router, message: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = post(app, MCP_PATH, message.to_string()).await;
        let status = response.status();
        let body = body_string(response).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn call(id: u64, name: &str, arguments: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
    }

    /// Pull the `data:` line out of an SSE frame.
    fn sse_data(frame: &str) -> &str {
        frame
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap_or_else(|| panic!("no data line in {:?}", frame))
    }

    async fn next_frame(body: &mut Body) -> String {
        let frame = body.frame().await.unwrap().unwrap();
        String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        let app = app();

        for uri in ["/", "/health", "/mcp/extra", "/sse/other"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body_string(response).await, "Not found");
        }

        let response = post(&app, "/rpc", "{}".to_string()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "Not found");
    }

    #[tokio::test]
    async fn test_initialize() {
        let (status, body) = rpc(
            &app(),
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": { "protocolVersion": "2024-11-05", "capabilities": {} }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["serverInfo"]["name"], "github-prs-mcp-server");
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialize_unknown_version_gets_latest() {
        let (_, body) = rpc(
            &app(),
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": { "protocolVersion": "1999-01-01" }
            }),
        )
        .await;
        assert_eq!(body["result"]["protocolVersion"], LATEST_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let (_, body) = rpc(
            &app(),
            serde_json::json!({ "jsonrpc": "2.0", "id": "a", "method": "tools/list" }),
        )
        .await;

        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["add", "calculate", "github-prs"]);
        assert!(body["result"]["tools"][0]["inputSchema"]["properties"]["a"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_add() {
        let (status, body) = rpc(&app(), call(7, "add", serde_json::json!({ "a": 2, "b": 3 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["content"][0]["type"], "text");
        assert_eq!(body["result"]["content"][0]["text"], "5");
        assert_eq!(body["result"]["isError"], false);
    }

    #[tokio::test]
    async fn test_tools_call_divide_by_zero() {
        let (_, body) = rpc(
            &app(),
            call(
                2,
                "calculate",
                serde_json::json!({ "operation": "divide", "a": 1, "b": 0 }),
            ),
        )
        .await;
        assert_eq!(
            body["result"]["content"][0]["text"],
            "Error: Cannot divide by zero"
        );
    }

    #[tokio::test]
    async fn test_tools_call_protocol_errors() {
        let app = app();

        let (_, body) = rpc(&app, call(3, "nope", serde_json::json!({}))).await;
        assert_eq!(body["error"]["code"], -32602);
        assert!(body["error"]["message"].as_str().unwrap().contains("nope"));
        assert!(body.get("result").is_none());

        let (_, body) = rpc(&app, call(4, "add", serde_json::json!({ "a": "x", "b": 1 }))).await;
        assert_eq!(body["error"]["code"], -32602);

        let (_, body) = rpc(
            &app,
            serde_json::json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call" }),
        )
        .await;
        assert_eq!(body["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_version() {
        let app = app();

        let (_, body) = rpc(
            &app,
            serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "resources/list" }),
        )
        .await;
        assert_eq!(body["error"]["code"], -32601);

        let (_, body) = rpc(
            &app,
            serde_json::json!({ "jsonrpc": "1.0", "id": 1, "method": "ping" }),
        )
        .await;
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_notification_is_accepted() {
        let response = post(
            &app(),
            MCP_PATH,
            serde_json::json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let response = post(&app(), MCP_PATH, "{not json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_non_request_json_is_invalid_request() {
        let app = app();

        for message in [
            serde_json::json!({ "jsonrpc": "2.0", "id": 3, "result": {} }),
            serde_json::json!([1, 2, 3]),
        ] {
            let response = post(&app, MCP_PATH, message.to_string()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: serde_json::Value =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body["error"]["code"], -32600, "{}", message);
        }
    }

    #[tokio::test]
    async fn test_sse_session_round_trip() {
        let app = app();

        let response = app
            .clone()
            .oneshot(Request::builder().uri(SSE_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let mut body = response.into_body();
        let endpoint_frame = next_frame(&mut body).await;
        assert!(endpoint_frame.contains("event: endpoint"));
        let endpoint = sse_data(&endpoint_frame).to_string();
        assert!(endpoint.starts_with("/sse/message?sessionId="));

        let response = post(
            &app,
            &endpoint,
            call(9, "calculate", serde_json::json!({ "operation": "subtract", "a": 10, "b": 4 }))
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let message_frame = next_frame(&mut body).await;
        assert!(message_frame.contains("event: message"));
        let message: serde_json::Value = serde_json::from_str(sse_data(&message_frame)).unwrap();
        assert_eq!(message["id"], 9);
        assert_eq!(message["result"]["content"][0]["text"], "6");
    }

    #[tokio::test]
    async fn test_sse_message_requires_known_session() {
        let app = app();
        let ping = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }).to_string();

        let response = post(&app, SSE_MESSAGE_PATH, ping.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post(&app, "/sse/message?sessionId=does-not-exist", ping).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "Session not found");
    }
}
