//! VPP forwarding backend: SR policies, steering rules and localsids via
//! vppctl.
//!
//! A seg6 path maps to two VPP objects keyed by the path's binding SID:
//! the SR policy carrying the segment list and the L3 steering rule for
//! the destination. vppctl reports failure as non-empty output, so every
//! unhappy outcome collapses into `STATUS_INTERNAL_ERROR`.

use std::sync::Arc;
use tracing::warn;

use srv6_rpc::Operation;
use srv6_types::{
    encode_behavior, BehaviorConfig, IpPrefix, Seg6LocalAction, Sid, Srv6PathConfig, StatusCode,
};

use crate::manager::CommandRunner;
use crate::shell::VPPCTL_CMD;

/// Renders a destination with an explicit prefix length, as VPP requires.
fn full_prefix(dest: &IpPrefix) -> String {
    match dest.len() {
        Some(_) => dest.to_string(),
        None if dest.is_v4() => format!("{}/32", dest.addr()),
        None => format!("{}/128", dest.addr()),
    }
}

/// Builds the `sr policy` command for a path.
pub fn sr_policy_cmd(operation: Operation, bsid: &Sid, path: &Srv6PathConfig) -> String {
    let mut cmd = format!("sr policy {} bsid {}", operation, bsid);
    if operation == Operation::Add {
        for segment in &path.sr_path {
            cmd.push_str(&format!(" next {}", segment));
        }
        if let Some(metric) = path.metric() {
            cmd.push_str(&format!(" weight {}", metric));
        }
        if let Some(table) = path.table() {
            cmd.push_str(&format!(" fib-table {}", table));
        }
    }
    cmd
}

/// Builds the `sr steer` command tying a destination to a policy.
pub fn sr_steer_cmd(operation: Operation, bsid: &Sid, path: &Srv6PathConfig) -> String {
    let del = if operation == Operation::Del { "del " } else { "" };
    let mut cmd = format!(
        "sr steer {}l3 {} via bsid {}",
        del,
        full_prefix(&path.destination),
        bsid
    );
    if operation == Operation::Add {
        if let Some(metric) = path.metric() {
            cmd.push_str(&format!(" weight {}", metric));
        }
        if let Some(table) = path.table() {
            cmd.push_str(&format!(" fib-table {}", table));
        }
    }
    cmd
}

/// Builds the `sr localsid` command for a behavior, or reports why the
/// behavior cannot be expressed in VPP.
pub fn sr_localsid_cmd(behavior: &BehaviorConfig) -> Result<String, StatusCode> {
    // Run the shared encoder first so missing parameters surface as
    // STATUS_INVALID_ACTION exactly like on the Linux backend.
    let encap = encode_behavior(behavior).map_err(|err| {
        warn!(segment = %behavior.segment, error = %err, "Rejected seg6local behavior");
        err.status()
    })?;
    // VPP cross-connect behaviors additionally need an outgoing interface.
    let xconnect_iface = || -> Result<&str, StatusCode> {
        if !behavior.interface.is_empty() {
            Ok(&behavior.interface)
        } else if !behavior.device.is_empty() {
            Ok(&behavior.device)
        } else {
            warn!(segment = %behavior.segment, action = %encap.action,
                  "VPP cross-connect behavior without an interface");
            Err(StatusCode::InvalidAction)
        }
    };
    let rendered = match encap.action {
        Seg6LocalAction::End => "behavior end".to_string(),
        Seg6LocalAction::EndX => format!(
            "behavior end.x {} {}",
            xconnect_iface()?,
            behavior.nexthop.map(|n| n.to_string()).unwrap_or_default()
        ),
        Seg6LocalAction::EndT => format!("behavior end.t {}", behavior.lookup_table),
        Seg6LocalAction::EndDx2 => format!("behavior end.dx2 {}", behavior.interface),
        Seg6LocalAction::EndDx6 => format!(
            "behavior end.dx6 {} {}",
            xconnect_iface()?,
            behavior.nexthop.map(|n| n.to_string()).unwrap_or_default()
        ),
        Seg6LocalAction::EndDx4 => format!(
            "behavior end.dx4 {} {}",
            xconnect_iface()?,
            behavior.nexthop.map(|n| n.to_string()).unwrap_or_default()
        ),
        Seg6LocalAction::EndDt6 => format!("behavior end.dt6 {}", behavior.lookup_table),
        Seg6LocalAction::EndDt4 => format!("behavior end.dt4 {}", behavior.lookup_table),
        Seg6LocalAction::EndDt46
        | Seg6LocalAction::EndB6
        | Seg6LocalAction::EndB6Encaps
        | Seg6LocalAction::UN => {
            warn!(action = %encap.action, "Behavior not supported by the VPP backend");
            return Err(StatusCode::OperationNotSupported);
        }
    };
    let mut cmd = format!("sr localsid address {} {}", behavior.segment, rendered);
    if let Some(table) = behavior.table() {
        cmd.push_str(&format!(" fib-table {}", table));
    }
    Ok(cmd)
}

/// Builds the `sr localsid del` command, keyed by the local segment.
pub fn sr_localsid_del_cmd(behavior: &BehaviorConfig) -> String {
    let mut cmd = format!("sr localsid del address {}", behavior.segment);
    if let Some(table) = behavior.table() {
        cmd.push_str(&format!(" fib-table {}", table));
    }
    cmd
}

/// Programs SR state into a local VPP instance.
pub struct VppManager {
    runner: Arc<dyn CommandRunner>,
}

impl VppManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Applies one path operation: the SR policy, then the steering rule.
    pub async fn apply_path(&self, operation: Operation, path: &Srv6PathConfig) -> StatusCode {
        match operation {
            Operation::Add | Operation::Del => {}
            Operation::Change | Operation::Get => return StatusCode::OperationNotSupported,
        }
        let Some(bsid) = path.bsid_addr else {
            warn!(destination = %path.destination, "VPP path without a binding SID");
            return StatusCode::BadRequest;
        };
        let status = self.run_vpp(&sr_policy_cmd(operation, &bsid, path)).await;
        if !status.is_success() {
            return status;
        }
        self.run_vpp(&sr_steer_cmd(operation, &bsid, path)).await
    }

    /// Applies one behavior operation as a localsid.
    pub async fn apply_behavior(
        &self,
        operation: Operation,
        behavior: &BehaviorConfig,
    ) -> StatusCode {
        let cmd = match operation {
            Operation::Add => match sr_localsid_cmd(behavior) {
                Ok(cmd) => cmd,
                Err(status) => return status,
            },
            Operation::Del => sr_localsid_del_cmd(behavior),
            Operation::Change | Operation::Get => return StatusCode::OperationNotSupported,
        };
        self.run_vpp(&cmd).await
    }

    async fn run_vpp(&self, cmd: &str) -> StatusCode {
        let full = format!("{} {}", VPPCTL_CMD, cmd);
        match self.runner.run(&full).await {
            Ok(result) if result.success() && result.combined_output().is_empty() => {
                StatusCode::Success
            }
            Ok(result) => {
                warn!(command = %full, output = %result.combined_output(),
                      "VPP returned an error");
                StatusCode::InternalError
            }
            Err(err) => {
                warn!(command = %full, error = %err, "Command execution failed");
                StatusCode::InternalError
            }
        }
    }
}
