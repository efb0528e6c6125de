//! Controller-side orchestration for SRv6 tunnels and uSID policies.
//!
//! This crate composes calls to one or two route programming agents into
//! higher-level operations:
//!
//! - [`tunnel`]: unidirectional and bidirectional tunnel create/destroy
//! - [`usid_policy`]: uSID policies over named nodes, compressed into
//!   micro-segment lists
//! - [`nodes`]: the node identity registry (name, control endpoint, uN and
//!   uDT segments, forwarding engine) with YAML push/pull
//!
//! Multi-step operations are sequential and stop at the first failure;
//! completed steps are never rolled back. Callers that need compensation
//! can layer it on top of the per-step functions, which are exposed
//! individually for that reason.

pub mod error;
pub mod nodes;
pub mod tunnel;
pub mod usid_policy;

// Re-export commonly used items at crate root
pub use error::{CtlError, CtlResult};
pub use nodes::{NodeInfo, NodeRegistry, NodesConfig};
pub use tunnel::{
    create_srv6_tunnel, create_uni_srv6_tunnel, destroy_srv6_tunnel, destroy_uni_srv6_tunnel,
    handle_srv6_behavior, handle_srv6_path, MAIN_TABLE_ID,
};
pub use usid_policy::{
    generate_bsid_addr, handle_srv6_usid_policy, AgentConnector, TcpAgentConnector, UsidPolicy,
};
