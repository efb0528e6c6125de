//! Translation of route programming failures into the status taxonomy.
//!
//! Kernel rejections surface as `RTNETLINK answers: <strerror>` lines on
//! stderr; the strings below are the strerror texts of the four errno
//! values the control plane distinguishes (EEXIST, ESRCH, ENODEV,
//! EOPNOTSUPP). Everything unrecognized collapses into
//! `STATUS_INTERNAL_ERROR`. The orchestrator's retry/ignore logic depends
//! on this mapping being exact.

use tracing::warn;

use srv6_types::StatusCode;

use crate::shell::ExecResult;

/// Maps a route command failure message onto a status code.
pub fn parse_route_error(stderr: &str) -> StatusCode {
    if stderr.contains("File exists") {
        warn!("Route programming error: File exists");
        StatusCode::FileExists
    } else if stderr.contains("No such process") {
        warn!("Route programming error: No such process");
        StatusCode::NoSuchProcess
    } else if stderr.contains("No such device") || stderr.contains("Cannot find device") {
        warn!("Route programming error: No such device");
        StatusCode::NoSuchDevice
    } else if stderr.contains("Operation not supported") {
        warn!("Route programming error: Operation not supported");
        StatusCode::OperationNotSupported
    } else {
        warn!(stderr = %stderr, "Generic route programming error");
        StatusCode::InternalError
    }
}

/// Folds a route command result into a status code.
pub fn status_from_exec(result: &ExecResult) -> StatusCode {
    if result.success() {
        StatusCode::Success
    } else {
        parse_route_error(&result.stderr)
    }
}
