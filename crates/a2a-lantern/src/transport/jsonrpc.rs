//! JSON-RPC 2.0 transport binding for A2A.
//!
//! Every task operation is encoded as a JSON-RPC 2.0 request POSTed over
//! HTTP(S). Streaming calls reuse the same envelope and switch the response
//! body to Server-Sent Events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{A2AError, A2AResult};

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Content type of JSON-RPC request bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Accept header for streaming calls.
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

// ── A2A Methods ──────────────────────────────────────────────

/// Standard A2A JSON-RPC method names.
pub mod methods {
    /// Send a task and wait for its result.
    pub const TASKS_SEND: &str = "tasks/send";

    /// Send a task and subscribe to its updates (SSE response).
    pub const TASKS_SEND_SUBSCRIBE: &str = "tasks/sendSubscribe";

    /// Query the status of a task.
    pub const TASKS_STATUS: &str = "tasks/status";

    /// Cancel a task.
    pub const TASKS_CANCEL: &str = "tasks/cancel";

    /// Send a standalone message.
    pub const MESSAGE_SEND: &str = "message/send";

    /// Send a standalone message with a streamed reply.
    pub const MESSAGE_STREAM: &str = "message/stream";

    /// Every method an `a2a` endpoint may declare.
    pub const ALL: [&str; 6] = [
        TASKS_SEND,
        TASKS_SEND_SUBSCRIBE,
        TASKS_STATUS,
        TASKS_CANCEL,
        MESSAGE_SEND,
        MESSAGE_STREAM,
    ];

    /// Check whether `method` is one of the standard method names.
    pub fn is_standard(method: &str) -> bool {
        ALL.contains(&method)
    }
}

// ── JSON-RPC Request ─────────────────────────────────────────

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// The method to invoke.
    pub method: String,

    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Correlation id, fresh for every request.
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request with a random correlation id.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id: RequestId::random(),
        }
    }

    /// Create a `tasks/send` request.
    pub fn send_task(params: Value) -> Self {
        Self::new(methods::TASKS_SEND, Some(params))
    }

    /// Create a `tasks/sendSubscribe` request.
    pub fn send_subscribe(params: Value) -> Self {
        Self::new(methods::TASKS_SEND_SUBSCRIBE, Some(params))
    }

    /// Create a `tasks/status` request.
    pub fn task_status(task_id: &str) -> Self {
        Self::new(
            methods::TASKS_STATUS,
            Some(serde_json::json!({ "id": task_id })),
        )
    }

    /// Create a `tasks/cancel` request.
    pub fn cancel_task(task_id: &str) -> Self {
        Self::new(
            methods::TASKS_CANCEL,
            Some(serde_json::json!({ "id": task_id })),
        )
    }

    /// Create a `message/send` request.
    pub fn send_message(params: Value) -> Self {
        Self::new(methods::MESSAGE_SEND, Some(params))
    }
}

// ── JSON-RPC Response ────────────────────────────────────────

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Must be "2.0".
    #[serde(default)]
    pub jsonrpc: String,

    /// The result (mutually exclusive with error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// The error (mutually exclusive with result).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// The request identifier this response corresponds to.
    #[serde(default)]
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    /// Check the envelope against the request it answers.
    ///
    /// The version tag must be "2.0", at most one of `result`/`error` may be
    /// present, and a non-null `id` must echo the request id.
    pub fn check(&self, request: &JsonRpcRequest) -> A2AResult<()> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(A2AError::Decode(format!(
                "unsupported jsonrpc version {:?}",
                self.jsonrpc
            )));
        }
        if self.result.is_some() && self.error.is_some() {
            return Err(A2AError::Decode(
                "response carries both result and error".into(),
            ));
        }
        match &self.id {
            Some(id) if !id.is_null() && *id != request.id => Err(A2AError::IdMismatch {
                what: "correlation id",
                expected: request.id.to_string(),
                actual: id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Extract the result payload, turning an error object into
    /// [`A2AError::JsonRpc`]. A missing result is `None`.
    pub fn into_result(self) -> A2AResult<Option<Value>> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result),
        }
    }
}

// ── JSON-RPC Error ───────────────────────────────────────────

/// A JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,

    /// Human-readable error message.
    pub message: String,

    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

impl From<JsonRpcError> for A2AError {
    fn from(e: JsonRpcError) -> Self {
        A2AError::JsonRpc {
            code: e.code,
            message: e.message,
            data: e.data,
        }
    }
}

// ── Request ID ───────────────────────────────────────────────

/// JSON-RPC request identifier (string, number, or null in error replies).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl RequestId {
    /// A fresh random identifier (UUIDv4).
    pub fn random() -> Self {
        RequestId::String(Uuid::new_v4().to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RequestId::Null)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => f.write_str(s),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest::send_task(serde_json::json!({
            "id": "task-1",
            "message": {
                "role": "user",
                "parts": [{"type": "text", "text": "Hello"}]
            }
        }));

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "tasks/send");
        assert_eq!(json["params"]["id"], "task-1");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = JsonRpcRequest::task_status("t");
        let b = JsonRpcRequest::task_status("t");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_standard_methods() {
        assert!(methods::is_standard("tasks/sendSubscribe"));
        assert!(methods::is_standard("message/stream"));
        assert!(!methods::is_standard("tasks/get"));
    }

    fn response(value: serde_json::Value) -> JsonRpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_response_error() {
        let req = JsonRpcRequest::cancel_task("abc123");
        let resp = response(serde_json::json!({
            "jsonrpc": "2.0",
            "id": req.id,
            "error": {"code": -32001, "message": "Task not found"}
        }));
        resp.check(&req).unwrap();
        match resp.into_result() {
            Err(A2AError::JsonRpc { code, message, .. }) => {
                assert_eq!(code, -32001);
                assert_eq!(message, "Task not found");
            }
            other => panic!("expected JSON-RPC error, got {other:?}"),
        }
    }

    #[test]
    fn test_response_with_both_members_is_malformed() {
        let req = JsonRpcRequest::task_status("t");
        let resp = response(serde_json::json!({
            "jsonrpc": "2.0",
            "id": req.id,
            "result": {},
            "error": {"code": -32001, "message": "Task not found"}
        }));
        assert!(matches!(resp.check(&req), Err(A2AError::Decode(_))));
    }

    #[test]
    fn test_response_id_mismatch() {
        let req = JsonRpcRequest::task_status("t");
        let resp = response(serde_json::json!({"jsonrpc": "2.0", "id": "other", "result": {}}));
        assert!(matches!(resp.check(&req), Err(A2AError::IdMismatch { .. })));

        let null_id = response(serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": -32700, "message": "Parse error"},
            "id": null
        }));
        null_id.check(&req).unwrap();
    }
}
