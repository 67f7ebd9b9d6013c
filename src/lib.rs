//! toolhost-mcp: an MCP tool server engine.
//!
//! This library implements the server side of an MCP-style tool-invocation
//! protocol: JSON-RPC 2.0 messages over a line-delimited transport, a
//! handshake-enforcing session state machine, and a registry of
//! strongly-typed tool handlers exposed behind one uniform call interface.
//!
//! # Architecture
//!
//! The engine provides the protocol plumbing. Tool authors provide typed
//! handler functions; the registry derives each tool's wire-level input
//! schema from the handler's input type at registration time.
//!
//! - **Session**: handshake, message ordering, request dispatch
//! - **Registry**: typed handlers, schema derivation, uniform invocation
//! - **Transport**: swappable line channel (stdio today)
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation

pub mod config;
pub mod error;
pub mod mcp;
