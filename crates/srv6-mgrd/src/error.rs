//! Error types for the route programming agent.

use std::io;
use thiserror::Error;

/// Result type alias for agent operations.
pub type MgrResult<T> = Result<T, MgrError>;

/// Errors that can occur inside the agent.
///
/// These never cross the wire: request handlers fold them into the status
/// taxonomy before replying.
#[derive(Debug, Error)]
pub enum MgrError {
    /// Failed to spawn a shell command.
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned a non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// The `ip -j link show` output could not be parsed.
    #[error("Failed to parse link listing: {message}")]
    LinkParse {
        /// Error message.
        message: String,
    },

    /// Daemon configuration error (bad environment variable).
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The setting that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl MgrError {
    /// Creates a link parse error.
    pub fn link_parse(message: impl Into<String>) -> Self {
        Self::LinkParse {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
