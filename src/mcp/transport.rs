//! Transport boundary for MCP messages.
//!
//! Messages are UTF-8 encoded JSON-RPC, delimited by newlines, and must not
//! contain embedded newlines. The [`Transport`] trait abstracts the channel
//! so the server loop can be driven by stdio today and other transports
//! later; implementations are injected at server construction.
//!
//! For [`StdioTransport`]:
//!
//! - stdin: receives messages from the client
//! - stdout: sends messages to the client
//! - stderr: may be used for logging (never MCP messages)

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Transport kinds the protocol defines.
///
/// Only [`Self::Stdio`] is implemented; the network kinds are declared for
/// the wire model and future use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Newline-delimited messages over standard input/output.
    Stdio,
    /// Plain HTTP transport (not implemented).
    Http,
    /// Server-sent events transport (not implemented).
    Sse,
}

/// Transport kinds this server can actually serve.
pub const SUPPORTED_TRANSPORTS: [TransportKind; 1] = [TransportKind::Stdio];

/// A line-delimited message channel.
///
/// Reading blocks until a full line is available or the stream ends; no
/// timeout applies to the read itself.
#[async_trait]
pub trait Transport: Send {
    /// Reads the next message line.
    ///
    /// Returns `None` when the stream is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the channel fails.
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Writes a single message line, newline-terminated and flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the channel fails.
    async fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// A stdio-based MCP transport.
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Handle for stdout.
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // EOF - stdin closed
            return Ok(None);
        }

        // Remove the trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !line.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}
