//! JSON-RPC 2.0 message types for the MCP protocol.
//!
//! This module defines the envelope types every wire message shares.
//! All messages follow the JSON-RPC 2.0 specification with MCP-specific
//! extensions.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `id`)
//! - **Response** / **Error**: A reply to a request (success or failure)
//! - **Notification**: A one-way message (no `id`, no response expected)
//!
//! # MCP-Specific Constraints
//!
//! - Request IDs must be strings or integers (never `null`)
//! - Every emitted response or error echoes the originating request ID
//! - Input that is neither a request nor a notification is dropped without
//!   an answer: there is no ID to correlate an error envelope to

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol method names.
///
/// Method matching is case-sensitive and exact; these constants are the
/// single source of truth for dispatch.
pub mod methods {
    /// Handshake request opening a session.
    pub const INITIALIZE: &str = "initialize";
    /// Liveness check request.
    pub const PING: &str = "ping";
    /// Request for the registered tool descriptors.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Request invoking a named tool.
    pub const TOOLS_CALL: &str = "tools/call";
    /// Client-side cancellation notice. Accepted, currently has no effect.
    pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";
    /// Handshake acknowledgment completing initialisation.
    pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";
    /// Tool list change notice. Note the singular "notification" prefix:
    /// that is the exact string on the wire, inconsistent with the others.
    pub const NOTIFICATION_TOOLS_LIST_CHANGED: &str = "notification/tools/listChanged";
}

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
///
/// Requests expect exactly one response from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 notification message (incoming).
///
/// Notifications do not have an ID and are never answered.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The result of the method call.
    pub result: Value,

    /// The request ID this response corresponds to.
    pub id: RequestId,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result,
            id,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// Server-defined error.
    ServerError(i32),
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError(code) => code,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ServerError(_) => "Server error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
///
/// Error responses always carry the originating request ID. Input that
/// cannot be correlated to a request never produces an error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to.
    pub id: RequestId,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: RequestId, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorData::from_code(ErrorCode::MethodNotFound))
    }

    /// Creates an invalid params error response.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// An incoming message that could be either a request or notification.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcNotification),
}

impl IncomingMessage {
    /// Returns the method name of this message.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(notif) => &notif.method,
        }
    }

    /// Returns the request ID if this is a request.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Notification(_) => None,
        }
    }
}

/// An outgoing message produced for a request: success or failure.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// A successful response.
    Response(JsonRpcResponse),
    /// An error response.
    Error(JsonRpcError),
}

impl OutgoingMessage {
    /// Returns the request ID this message answers.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        match self {
            Self::Response(resp) => &resp.id,
            Self::Error(err) => &err.id,
        }
    }

    /// Serialises this message to a single-line JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Classifies a line of input as a request or notification.
///
/// A request needs a well-formed envelope (`jsonrpc` == "2.0"), a non-empty
/// `method`, and an `id`; a notification needs the same minus the `id`.
/// Anything else — malformed JSON, wrong envelope version, a missing method —
/// returns `None` and must be dropped silently by the caller.
#[must_use]
pub fn classify_message(json: &str) -> Option<IncomingMessage> {
    let value: Value = serde_json::from_str(json).ok()?;
    let obj = value.as_object()?;

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return None;
    }

    if obj.contains_key("id") {
        let request: JsonRpcRequest = serde_json::from_value(value).ok()?;
        if request.method.is_empty() {
            return None;
        }
        Some(IncomingMessage::Request(request))
    } else {
        let notification: JsonRpcNotification = serde_json::from_value(value).ok()?;
        if notification.method.is_empty() {
            return None;
        }
        Some(IncomingMessage::Notification(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_valid_request() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}"#;
        let msg = classify_message(json).unwrap();

        let IncomingMessage::Request(req) = msg else {
            panic!("Expected Request, got Notification");
        };
        assert_eq!(req.id, RequestId::Number(1));
        assert_eq!(req.method, methods::INITIALIZE);
    }

    #[test]
    fn classify_valid_notification() {
        let json = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;
        let msg = classify_message(json).unwrap();

        let IncomingMessage::Notification(notif) = msg else {
            panic!("Expected Notification, got Request");
        };
        assert_eq!(notif.method, methods::NOTIFICATION_INITIALIZED);
    }

    #[test]
    fn classify_string_id() {
        let json = r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "test"}"#;
        let msg = classify_message(json).unwrap();

        let IncomingMessage::Request(req) = msg else {
            panic!("Expected Request, got Notification");
        };
        assert_eq!(req.id, RequestId::String("abc-123".to_string()));
    }

    #[test]
    fn classify_invalid_json() {
        assert!(classify_message("not valid json").is_none());
    }

    #[test]
    fn classify_missing_jsonrpc() {
        let json = r#"{"id": 1, "method": "test"}"#;
        assert!(classify_message(json).is_none());
    }

    #[test]
    fn classify_wrong_jsonrpc_version() {
        let json = r#"{"jsonrpc": "1.0", "id": 1, "method": "test"}"#;
        assert!(classify_message(json).is_none());
    }

    #[test]
    fn classify_empty_method() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": ""}"#;
        assert!(classify_message(json).is_none());
    }

    #[test]
    fn classify_non_object() {
        assert!(classify_message("[1, 2, 3]").is_none());
        assert!(classify_message("42").is_none());
    }

    #[test]
    fn serialise_success_response() {
        let response =
            JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""result":{"ok":true}"#));
    }

    #[test]
    fn serialise_error_response() {
        let error = JsonRpcError::method_not_found(RequestId::Number(1));
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""code":-32601"#));
    }

    #[test]
    fn serialise_outgoing_untagged() {
        let out = OutgoingMessage::Response(JsonRpcResponse::success(
            RequestId::String("r-1".to_string()),
            serde_json::json!({}),
        ));
        let json = out.to_json().unwrap();
        // Untagged: no enum variant wrapper on the wire
        assert!(json.starts_with('{'));
        assert!(json.contains(r#""id":"r-1""#));
        assert!(!json.contains("Response"));
    }

    #[test]
    fn error_data_with_data() {
        let data = JsonRpcErrorData::from_code(ErrorCode::InvalidParams)
            .with_data(serde_json::json!({"field": "name"}));
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""code":-32602"#));
        assert!(json.contains(r#""field":"name""#));
    }

    #[test]
    fn error_codes_are_reserved_values() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
        assert_eq!(ErrorCode::ServerError(-32000).code(), -32000);
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::Number(42)), "42");
        assert_eq!(format!("{}", RequestId::String("abc".to_string())), "abc");
    }
}
