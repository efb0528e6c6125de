//! Status codes shared by the controller and the node agents.
//!
//! The numeric values and wire names of these codes are part of the control
//! protocol contract: an agent reply must carry the same code all the way
//! back to the client that initiated the operation. Do not renumber.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a route programming or orchestration operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Operation completed successfully.
    #[serde(rename = "STATUS_SUCCESS")]
    Success,
    /// Operation not supported.
    #[serde(rename = "STATUS_OPERATION_NOT_SUPPORTED")]
    OperationNotSupported,
    /// Bad request.
    #[serde(rename = "STATUS_BAD_REQUEST")]
    BadRequest,
    /// Internal error.
    #[serde(rename = "STATUS_INTERNAL_ERROR")]
    InternalError,
    /// The request could not be decoded.
    #[serde(rename = "STATUS_INVALID_GRPC_REQUEST")]
    InvalidGrpcRequest,
    /// Entity already exists.
    #[serde(rename = "STATUS_FILE_EXISTS")]
    FileExists,
    /// Entity not found.
    #[serde(rename = "STATUS_NO_SUCH_PROCESS")]
    NoSuchProcess,
    /// Invalid seg6local action.
    #[serde(rename = "STATUS_INVALID_ACTION")]
    InvalidAction,
    /// The agent is unreachable.
    #[serde(rename = "STATUS_GRPC_SERVICE_UNAVAILABLE")]
    GrpcServiceUnavailable,
    /// The agent rejected the caller's credentials.
    #[serde(rename = "STATUS_GRPC_UNAUTHORIZED")]
    GrpcUnauthorized,
    /// Not configured.
    #[serde(rename = "STATUS_NOT_CONFIGURED")]
    NotConfigured,
    /// Already configured.
    #[serde(rename = "STATUS_ALREADY_CONFIGURED")]
    AlreadyConfigured,
    /// Device not found.
    #[serde(rename = "STATUS_NO_SUCH_DEVICE")]
    NoSuchDevice,
}

impl StatusCode {
    /// Every status code, in wire order.
    pub const ALL: [StatusCode; 13] = [
        StatusCode::Success,
        StatusCode::OperationNotSupported,
        StatusCode::BadRequest,
        StatusCode::InternalError,
        StatusCode::InvalidGrpcRequest,
        StatusCode::FileExists,
        StatusCode::NoSuchProcess,
        StatusCode::InvalidAction,
        StatusCode::GrpcServiceUnavailable,
        StatusCode::GrpcUnauthorized,
        StatusCode::NotConfigured,
        StatusCode::AlreadyConfigured,
        StatusCode::NoSuchDevice,
    ];

    /// Stable numeric wire value.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Looks up a status code by its numeric wire value.
    pub fn from_code(code: i32) -> Option<StatusCode> {
        Self::ALL.get(usize::try_from(code).ok()?).copied()
    }

    /// Returns true for `STATUS_SUCCESS`.
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// Human-readable description of the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            StatusCode::Success => "Operation completed successfully",
            StatusCode::OperationNotSupported => "Operation not supported",
            StatusCode::BadRequest => "Bad request",
            StatusCode::InternalError => "Internal error",
            StatusCode::InvalidGrpcRequest => "Invalid gRPC request",
            StatusCode::FileExists => "Entity already exists",
            StatusCode::NoSuchProcess => "Entity not found",
            StatusCode::InvalidAction => "Invalid action",
            StatusCode::GrpcServiceUnavailable => "Unreachable gRPC server",
            StatusCode::GrpcUnauthorized => "Unauthorized",
            StatusCode::NotConfigured => "Not configured",
            StatusCode::AlreadyConfigured => "Already configured",
            StatusCode::NoSuchDevice => "Device not found",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
