//! Control protocol between the SRv6 controller and the node agents.
//!
//! The protocol carries `(path | behavior)` payloads under an out-of-band
//! operation (`add`/`get`/`change`/`del`) and returns a bare status code.
//! Frames are length-delimited JSON over TCP; the framing is plumbing, the
//! contract is the message shapes in [`proto`] and the status codes of
//! [`srv6_types::status`](srv6_types::StatusCode).
//!
//! - [`proto`]: request/reply message shapes
//! - [`service`]: the [`Srv6Agent`] trait both sides of the wire implement
//! - [`wire`]: frame codec helpers
//! - [`client`]: per-call connection client with timeout and
//!   transport-error mapping
//! - [`server`]: accept loop dispatching decoded requests to a service

pub mod client;
pub mod error;
pub mod proto;
pub mod server;
pub mod service;
pub mod wire;

// Re-export commonly used items at crate root
pub use client::{AgentClient, DEFAULT_REQUEST_TIMEOUT};
pub use error::RpcError;
pub use proto::{
    BehaviorRequest, Operation, PathRequest, RequestBody, Srv6ManagerReply, Srv6ManagerRequest,
};
pub use server::AgentServer;
pub use service::{MockAgent, MockCall, Srv6Agent};
