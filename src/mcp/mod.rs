//! Model Context Protocol (MCP) server engine.
//!
//! This module implements the MCP specification for exposing named,
//! schema-described tools to AI hosts. The server communicates over a
//! line-delimited transport using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐    │
//! │   │  Transport  │───▶│   Session   │───▶│ ToolRegistry │    │
//! │   │   (stdio)   │    │ (lifecycle) │    │  (handlers)  │    │
//! │   └─────────────┘    └─────────────┘    └──────────────┘    │
//! │          │                  │                   │            │
//! │          ▼                  ▼                   ▼            │
//! │   ┌──────────────────────────────────────────────────┐      │
//! │   │               JSON-RPC Messages                  │      │
//! │   └──────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2025-06-18.

pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use registry::ToolRegistry;
pub use server::Server;
pub use session::{McpSession, Stage};
pub use transport::{StdioTransport, Transport};
pub use types::{CallToolResult, Content};
