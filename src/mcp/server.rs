//! MCP server loop.
//!
//! The server owns a [`Transport`] and an [`McpSession`] and shuttles lines
//! between them: each line read is handed to the session, and any message
//! the session produces is serialised and written back. The loop ends when
//! the transport reaches end-of-stream, reads an empty line, reads the
//! literal text `exit`, or a termination signal arrives.
//!
//! One server serves one session; the session (and its tool registry) lives
//! for the whole process.

use std::io;

use crate::mcp::registry::ToolRegistry;
use crate::mcp::session::McpSession;
use crate::mcp::transport::Transport;
use crate::mcp::types::{Implementation, ServerCapabilities};

/// Sentinel line that terminates the server loop.
const EXIT_SENTINEL: &str = "exit";

/// An MCP server: one transport, one session.
pub struct Server {
    transport: Box<dyn Transport>,
    session: McpSession,
}

impl Server {
    /// Creates a server advertising the given identity.
    ///
    /// The transport and registry are moved in; the server is the sole owner
    /// of both for the rest of the process.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        instruction: Option<String>,
        transport: Box<dyn Transport>,
        registry: ToolRegistry,
    ) -> Self {
        let server_info = Implementation {
            name: name.into(),
            version: version.into(),
        };
        Self {
            transport,
            session: McpSession::new(
                ServerCapabilities::default(),
                server_info,
                instruction,
                registry,
            ),
        }
    }

    /// Runs the server loop until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown signals.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, shutting down");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown signals.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result of one transport read.
    ///
    /// Returns `true` if the server should stop.
    async fn handle_transport_result(
        &mut self,
        line_result: io::Result<Option<String>>,
    ) -> io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("Transport closed, shutting down");
            return Ok(true);
        };

        // An empty read ends the session just like end-of-stream does.
        if line.is_empty() {
            tracing::info!("Empty read, shutting down");
            return Ok(true);
        }

        if line == EXIT_SENTINEL {
            tracing::info!("Exit requested, shutting down");
            return Ok(true);
        }

        self.handle_line(&line).await?;
        Ok(false)
    }

    /// Feeds one line to the session and writes back any produced message.
    async fn handle_line(&mut self, line: &str) -> io::Result<()> {
        let Some(outgoing) = self.session.handle_input(line) else {
            return Ok(());
        };

        let json = outgoing
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.transport.write_line(&json).await
    }
}
