//! Error types for controller-side orchestration.

use std::io;
use thiserror::Error;

/// Result type alias for controller operations.
pub type CtlResult<T> = Result<T, CtlError>;

/// Errors detected locally on the controller, before or instead of
/// talking to an agent. Remote outcomes travel as
/// [`StatusCode`](srv6_types::StatusCode) values, not as errors.
#[derive(Debug, Error)]
pub enum CtlError {
    /// The caller supplied an invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// A node name has no entry in the nodes configuration.
    #[error("Node '{name}' not found in the nodes configuration")]
    NodeNotFound {
        /// The missing node name.
        name: String,
    },

    /// The nodes configuration is malformed.
    #[error("Invalid nodes configuration: {message}")]
    InvalidConfiguration {
        /// What was wrong.
        message: String,
    },

    /// The nodes configuration file could not be read or written.
    #[error("Failed to access nodes configuration at '{path}': {source}")]
    ConfigIo {
        /// The file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The nodes configuration file is not valid YAML.
    #[error("Failed to parse nodes configuration: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),
}

impl CtlError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a node-not-found error.
    pub fn node_not_found(name: impl Into<String>) -> Self {
        Self::NodeNotFound { name: name.into() }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
