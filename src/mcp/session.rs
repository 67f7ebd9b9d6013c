//! MCP session state machine.
//!
//! A session drives the protocol lifecycle for one client:
//!
//! 1. **Uninitialized**: only the `initialize` request is accepted
//! 2. **Initialized**: waiting for the client's acknowledgment notification,
//!    bounded by a 5-second deadline
//! 3. **Operation**: `tools/list` and `tools/call` are served
//! 4. **Shutdown**: reserved terminal stage; nothing transitions into it yet
//!
//! The session classifies each input line as a request or a notification and
//! routes it through the current stage. Requests always produce exactly one
//! response or error carrying the original ID; notifications and
//! unclassifiable input produce nothing.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::mcp::protocol::{
    classify_message, methods, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, OutgoingMessage, RequestId,
    MCP_PROTOCOL_VERSION,
};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, ListToolsResult,
    ServerCapabilities,
};

/// How long the client has to acknowledge initialisation.
const INIT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for the `initialize` request.
    Uninitialized,
    /// Initialise answered; waiting for the acknowledgment notification.
    Initialized,
    /// Normal operation: tool requests are served.
    Operation,
    /// Shutting down. Reserved; no current transition reaches it.
    Shutdown,
}

/// State machine managing one MCP session.
///
/// Owns the tool registry for its entire lifetime; a session is created once
/// per server and never recreated.
pub struct McpSession {
    stage: Stage,
    /// Acknowledgment deadline, armed when `Initialized` is entered.
    init_deadline: Option<Instant>,
    registry: ToolRegistry,
    capabilities: ServerCapabilities,
    server_info: Implementation,
    instruction: Option<String>,
}

impl McpSession {
    /// Creates a session from its advertised identity and a tool registry.
    ///
    /// The registry is transferred into the session and cannot be mutated
    /// afterwards.
    #[must_use]
    pub const fn new(
        capabilities: ServerCapabilities,
        server_info: Implementation,
        instruction: Option<String>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            stage: Stage::Uninitialized,
            init_deadline: None,
            registry,
            capabilities,
            server_info,
            instruction,
        }
    }

    /// Returns the current lifecycle stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Handles one line of raw input.
    ///
    /// Returns the message to write back, or `None` for notifications and
    /// input that cannot be classified (there is no ID to answer to).
    pub fn handle_input(&mut self, text: &str) -> Option<OutgoingMessage> {
        match classify_message(text) {
            Some(IncomingMessage::Request(request)) => Some(self.handle_request(request)),
            Some(IncomingMessage::Notification(notification)) => {
                self.handle_notification(&notification);
                None
            }
            None => {
                tracing::debug!("Dropped input that is neither request nor notification");
                None
            }
        }
    }

    /// Routes a request through the current stage.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> OutgoingMessage {
        if self.has_init_timeout() {
            // Stage intentionally left at Initialized: only the (late)
            // acknowledgment notification can still unlock the session.
            return Self::create_error("Initialization timeout", request.id);
        }

        match self.stage {
            Stage::Uninitialized => self.try_initialize(&request),
            Stage::Initialized => {
                Self::create_error("Waiting for 'notifications/initialized'", request.id)
            }
            Stage::Operation => self.handle_operation(request),
            Stage::Shutdown => Self::create_error("Server is shutting down", request.id),
        }
    }

    fn has_init_timeout(&self) -> bool {
        self.stage == Stage::Initialized
            && self
                .init_deadline
                .is_some_and(|deadline| Instant::now() > deadline)
    }

    /// Handles the only request accepted while uninitialized.
    fn try_initialize(&mut self, request: &JsonRpcRequest) -> OutgoingMessage {
        if request.method != methods::INITIALIZE {
            return Self::create_error("Invalid request method", request.id.clone());
        }

        // Client parameters are informational; a malformed block does not
        // block the handshake.
        if let Some(params) = request.params.as_ref() {
            match serde_json::from_value::<InitializeParams>(params.clone()) {
                Ok(params) => {
                    if let Some(client) = params.client_info {
                        tracing::info!(
                            client = %client.name,
                            version = %client.version,
                            "Client connected"
                        );
                    }
                }
                Err(e) => tracing::debug!(error = %e, "Malformed initialize params"),
            }
        }

        self.stage = Stage::Initialized;
        self.init_deadline = Some(Instant::now() + INIT_ACK_TIMEOUT);
        tracing::info!("Session entered Initialized stage");

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
            instruction: self.instruction.clone(),
        };

        Self::make_response(&result, request.id.clone())
    }

    /// Handles requests in the Operation stage.
    fn handle_operation(&mut self, request: JsonRpcRequest) -> OutgoingMessage {
        match request.method.as_str() {
            methods::TOOLS_LIST => {
                let result = ListToolsResult {
                    tools: self.registry.list(),
                };
                Self::make_response(&result, request.id)
            }
            methods::TOOLS_CALL => self.handle_tool_call(request),
            _ => OutgoingMessage::Error(JsonRpcError::method_not_found(request.id)),
        }
    }

    fn handle_tool_call(&mut self, request: JsonRpcRequest) -> OutgoingMessage {
        let params = match Self::extract_call_params(request.params.as_ref()) {
            Ok(params) => params,
            Err(message) => return Self::create_error(message, request.id),
        };

        tracing::debug!(tool = %params.name, "Calling tool");

        match self.registry.call(&params.name, params.arguments) {
            Ok(result) => Self::make_response(&result, request.id),
            Err(e) => Self::create_error(e.to_string(), request.id),
        }
    }

    /// Extracts tool call parameters from a request's params value.
    ///
    /// Two shapes exist in the wild: the call object directly under
    /// `params`, and the call object under one extra nested `params` key.
    /// The flat shape is tried first.
    fn extract_call_params(params: Option<&Value>) -> Result<CallToolParams, String> {
        let params = params.ok_or_else(|| "Missing tool call params".to_string())?;

        if let Ok(call) = serde_json::from_value::<CallToolParams>(params.clone()) {
            return Ok(call);
        }

        if let Some(nested) = params.get("params") {
            if let Ok(call) = serde_json::from_value::<CallToolParams>(nested.clone()) {
                return Ok(call);
            }
        }

        Err("Malformed tool call params".to_string())
    }

    /// Handles a notification. Notifications are never answered.
    fn handle_notification(&mut self, notification: &JsonRpcNotification) {
        if notification.method == methods::NOTIFICATION_INITIALIZED
            && self.stage == Stage::Initialized
        {
            self.stage = Stage::Operation;
            self.init_deadline = None;
            tracing::info!("Session entered Operation stage");
            return;
        }

        // Everything else — including "notifications/cancelled", which the
        // wire model defines but nothing acts on — is accepted and dropped.
        tracing::debug!(method = %notification.method, "Ignored notification");
    }

    /// Builds a success response wrapping a serialisable result.
    fn make_response<T: Serialize>(result: &T, id: RequestId) -> OutgoingMessage {
        match serde_json::to_value(result) {
            Ok(value) => OutgoingMessage::Response(JsonRpcResponse::success(id, value)),
            Err(e) => OutgoingMessage::Error(JsonRpcError::internal_error(
                id,
                format!("Failed to serialise result: {e}"),
            )),
        }
    }

    /// Builds an error response with the default `InvalidParams` code.
    fn create_error(message: impl Into<String>, id: RequestId) -> OutgoingMessage {
        OutgoingMessage::Error(JsonRpcError::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        ))
    }
}
