//! Core types for the SRv6 policy and tunnel orchestration engine.
//!
//! This crate holds everything that is shared between the controller and the
//! per-node route programming agents and does not perform I/O:
//!
//! - [`sid`]: SID, locator and prefix value types
//! - [`usid`]: the micro-segment (uSID) compression codec
//! - [`behavior`]: seg6local actions and the behavior-to-encap encoder
//! - [`path`]: seg6 path configuration (destination, SID list, encap mode)
//! - [`status`]: the status code vocabulary shared across the RPC boundary
//! - [`error`]: validation error types
//!
//! All types here are plain values; programming the kernel and talking to
//! remote agents happen in `srv6-mgrd` and `srv6-rpc` respectively.

pub mod behavior;
pub mod error;
pub mod path;
pub mod sid;
pub mod status;
pub mod usid;

// Re-export commonly used items at crate root
pub use behavior::{encode_behavior, BehaviorConfig, Seg6LocalAction, Seg6LocalAttrs, Seg6LocalEncap};
pub use error::{CodecError, EncodeError, ParseError};
pub use path::{EncapMode, FwdEngine, Srv6PathConfig, UNSET};
pub use sid::{IpPrefix, Locator, Sid};
pub use status::StatusCode;
