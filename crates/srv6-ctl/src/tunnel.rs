//! Tunnel orchestration over one or two route programming agents.
//!
//! A unidirectional tunnel is a seg6 path on the ingress node plus,
//! optionally, an End.DT6 decap behavior on the egress node; a
//! bidirectional tunnel is two of those. Steps run sequentially and the
//! first non-success status stops the operation and is returned to the
//! caller. Completed steps are never compensated: a tunnel that failed
//! halfway stays half-programmed, and destroying it with `ignore_errors`
//! set is the supported way to converge.

use tracing::{info, warn};

use srv6_rpc::{Operation, PathRequest, BehaviorRequest, Srv6Agent};
use srv6_types::{
    BehaviorConfig, FwdEngine, IpPrefix, Seg6LocalAction, Sid, Srv6PathConfig, StatusCode,
};

use crate::error::{CtlError, CtlResult};

/// The kernel's main routing table, used for the egress decap lookup.
pub const MAIN_TABLE_ID: i32 = 254;

/// Sends one path operation to an agent after local validation.
///
/// An add with no segments and a VPP path with no binding SID never leave
/// the controller.
pub async fn handle_srv6_path(
    agent: &dyn Srv6Agent,
    operation: Operation,
    config: Srv6PathConfig,
    fwd_engine: FwdEngine,
) -> CtlResult<StatusCode> {
    if fwd_engine == FwdEngine::Vpp && config.bsid_addr.is_none() {
        return Err(CtlError::invalid_argument(
            "bsid_addr is mandatory for the VPP forwarding engine",
        ));
    }
    if operation == Operation::Add && config.sr_path.is_empty() {
        return Err(CtlError::invalid_argument(
            "Missing segments for seg6 route",
        ));
    }
    Ok(agent
        .handle_path(operation, PathRequest::single(config, fwd_engine))
        .await)
}

/// Sends one behavior operation to an agent after local validation.
pub async fn handle_srv6_behavior(
    agent: &dyn Srv6Agent,
    operation: Operation,
    config: BehaviorConfig,
    fwd_engine: FwdEngine,
) -> CtlResult<StatusCode> {
    if operation == Operation::Add && config.action.is_none() {
        return Err(CtlError::invalid_argument(
            "Missing action for seg6local route",
        ));
    }
    Ok(agent
        .handle_behavior(operation, BehaviorRequest::single(config, fwd_engine))
        .await)
}

fn log_status(status: StatusCode, success_msg: &str, failure_msg: &str) {
    if status.is_success() {
        info!("{}", success_msg);
    } else {
        warn!(status = %status, "{}", failure_msg);
    }
}

/// Creates a unidirectional tunnel from `ingress` to `egress`.
///
/// Installs the seg6 path on the ingress node first; only if that
/// succeeds and `localseg` is given, installs the End.DT6 decap behavior
/// on the egress node. A failure in the second step leaves the ingress
/// path installed.
#[allow(clippy::too_many_arguments)]
pub async fn create_uni_srv6_tunnel(
    ingress: &dyn Srv6Agent,
    egress: &dyn Srv6Agent,
    destination: IpPrefix,
    segments: Vec<Sid>,
    localseg: Option<Sid>,
    bsid_addr: Option<Sid>,
    fwd_engine: FwdEngine,
) -> CtlResult<StatusCode> {
    // Equivalent to, on the ingress node:
    //    ip -6 route add <destination> encap seg6 mode encap \
    //            segs <segments> dev <device>
    let mut path = Srv6PathConfig::new(destination).with_segments(segments);
    if let Some(bsid) = bsid_addr {
        path = path.with_bsid(bsid);
    }
    let status = handle_srv6_path(ingress, Operation::Add, path, fwd_engine).await?;
    log_status(status, "Added SRv6 path", "Failed to add SRv6 path");
    if !status.is_success() {
        return Ok(status);
    }

    // Equivalent to, on the egress node:
    //    ip -6 route add <localseg> encap seg6local action End.DT6 \
    //            table 254 dev <device>
    if let Some(localseg) = localseg {
        let behavior = BehaviorConfig::new(localseg)
            .with_action(Seg6LocalAction::EndDt6)
            .with_lookup_table(MAIN_TABLE_ID);
        let status = handle_srv6_behavior(egress, Operation::Add, behavior, fwd_engine).await?;
        log_status(status, "Added SRv6 behavior", "Failed to add SRv6 behavior");
        if !status.is_success() {
            return Ok(status);
        }
    }
    Ok(StatusCode::Success)
}

/// Creates a bidirectional tunnel between `node_l` and `node_r`.
///
/// The left-to-right direction is created first; the right-to-left
/// direction is attempted only if it succeeded. The first failure is
/// returned and the already-created direction is not compensated.
#[allow(clippy::too_many_arguments)]
pub async fn create_srv6_tunnel(
    node_l: &dyn Srv6Agent,
    node_r: &dyn Srv6Agent,
    sidlist_lr: Vec<Sid>,
    sidlist_rl: Vec<Sid>,
    dest_lr: IpPrefix,
    dest_rl: IpPrefix,
    localseg_lr: Option<Sid>,
    localseg_rl: Option<Sid>,
    bsid_addr: Option<Sid>,
    fwd_engine: FwdEngine,
) -> CtlResult<StatusCode> {
    let status = create_uni_srv6_tunnel(
        node_l, node_r, dest_lr, sidlist_lr, localseg_lr, bsid_addr, fwd_engine,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    let status = create_uni_srv6_tunnel(
        node_r, node_l, dest_rl, sidlist_rl, localseg_rl, bsid_addr, fwd_engine,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    Ok(StatusCode::Success)
}

/// Destroys a unidirectional tunnel from `ingress` to `egress`.
///
/// `ignore_errors` forgives exactly one failure class: a delete that
/// reports `STATUS_NO_SUCH_PROCESS` (the route was already gone). Any
/// other failure aborts the operation regardless of the flag.
#[allow(clippy::too_many_arguments)]
pub async fn destroy_uni_srv6_tunnel(
    ingress: &dyn Srv6Agent,
    egress: &dyn Srv6Agent,
    destination: IpPrefix,
    localseg: Option<Sid>,
    bsid_addr: Option<Sid>,
    fwd_engine: FwdEngine,
    ignore_errors: bool,
) -> CtlResult<StatusCode> {
    let mut path = Srv6PathConfig::new(destination);
    if let Some(bsid) = bsid_addr {
        path = path.with_bsid(bsid);
    }
    let status = handle_srv6_path(ingress, Operation::Del, path, fwd_engine).await?;
    log_status(status, "Removed SRv6 path", "Failed to remove SRv6 path");
    if status == StatusCode::NoSuchProcess {
        if !ignore_errors {
            return Ok(status);
        }
    } else if !status.is_success() {
        return Ok(status);
    }

    if let Some(localseg) = localseg {
        let behavior = BehaviorConfig::new(localseg);
        let status = handle_srv6_behavior(egress, Operation::Del, behavior, fwd_engine).await?;
        log_status(
            status,
            "Removed SRv6 behavior",
            "Failed to remove SRv6 behavior",
        );
        if status == StatusCode::NoSuchProcess {
            if !ignore_errors {
                return Ok(status);
            }
        } else if !status.is_success() {
            return Ok(status);
        }
    }
    Ok(StatusCode::Success)
}

/// Destroys a bidirectional tunnel between `node_l` and `node_r`.
#[allow(clippy::too_many_arguments)]
pub async fn destroy_srv6_tunnel(
    node_l: &dyn Srv6Agent,
    node_r: &dyn Srv6Agent,
    dest_lr: IpPrefix,
    dest_rl: IpPrefix,
    localseg_lr: Option<Sid>,
    localseg_rl: Option<Sid>,
    bsid_addr: Option<Sid>,
    fwd_engine: FwdEngine,
    ignore_errors: bool,
) -> CtlResult<StatusCode> {
    let status = destroy_uni_srv6_tunnel(
        node_l,
        node_r,
        dest_lr,
        localseg_lr,
        bsid_addr,
        fwd_engine,
        ignore_errors,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    let status = destroy_uni_srv6_tunnel(
        node_r,
        node_l,
        dest_rl,
        localseg_rl,
        bsid_addr,
        fwd_engine,
        ignore_errors,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    Ok(StatusCode::Success)
}
