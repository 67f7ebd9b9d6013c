//! Error types for toolhost-mcp.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors produced by tool registry invocation.
///
/// The two variants stay distinguishable even though both surface as an
/// `InvalidParams` error at the protocol layer.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No tool is registered under the requested name.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The supplied arguments do not match the tool's input type.
    #[error("Invalid arguments for tool '{name}': {source}")]
    InvalidArguments {
        /// Name of the tool that rejected the arguments.
        name: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn tool_not_found_names_the_tool() {
        let error = RegistryError::ToolNotFound("resize_image".to_string());
        assert!(error.to_string().contains("resize_image"));
    }

    #[test]
    fn invalid_arguments_names_the_tool() {
        let source =
            serde_json::from_value::<i64>(serde_json::json!("nope")).unwrap_err();
        let error = RegistryError::InvalidArguments {
            name: "add".to_string(),
            source,
        };
        let msg = error.to_string();
        assert!(msg.contains("add"));
        assert!(msg.contains("Invalid arguments"));
    }
}
