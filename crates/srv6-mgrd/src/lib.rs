//! SRv6 route programming agent.
//!
//! srv6-mgrd runs on every managed node and turns decoded control-protocol
//! requests into forwarding state:
//!
//! - seg6 steering routes and seg6local behaviors in the Linux kernel,
//!   programmed through iproute2
//! - SR policies, steering rules and localsids in VPP, programmed through
//!   vppctl
//! - interface enumeration with a loopback/non-loopback partition and a
//!   name-to-index cache
//! - translation of route programming failures into the shared status
//!   taxonomy

pub mod commands;
pub mod error;
pub mod iface;
pub mod linux;
pub mod manager;
pub mod shell;
pub mod status_map;
pub mod vpp;

// Re-export commonly used items at crate root
pub use error::{MgrError, MgrResult};
pub use iface::InterfaceCache;
pub use manager::{CommandRunner, RecordingRunner, ShellRunner, Srv6Manager};
