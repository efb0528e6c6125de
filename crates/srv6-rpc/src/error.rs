//! Transport-level error types and their status mapping.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use srv6_types::StatusCode;

/// Errors raised by the control protocol client and server plumbing.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A message could not be serialized.
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame could not be parsed into a message.
    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// The agent could not be reached.
    #[error("Failed to connect to agent at {addr}: {source}")]
    Connect {
        /// Address of the agent.
        addr: SocketAddr,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The call did not complete within the caller's deadline.
    #[error("Request to {addr} timed out after {timeout:?}")]
    Timeout {
        /// Address of the agent.
        addr: SocketAddr,
        /// The deadline that expired.
        timeout: Duration,
    },

    /// The connection dropped before a reply arrived.
    #[error("Connection closed before a reply was received")]
    ConnectionClosed,

    /// Any other socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RpcError {
    /// Maps a transport failure into the shared status taxonomy.
    ///
    /// An unreachable or unresponsive agent is reported as service
    /// unavailability; local serialization bugs surface as internal
    /// errors. Authentication failures are not mapped here because the
    /// server reports them as reply data, not as transport faults.
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Connect { .. }
            | RpcError::Timeout { .. }
            | RpcError::ConnectionClosed
            | RpcError::Io(_) => StatusCode::GrpcServiceUnavailable,
            RpcError::Encode(_) | RpcError::Decode(_) => StatusCode::InternalError,
        }
    }
}
