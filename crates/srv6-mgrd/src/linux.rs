//! Linux forwarding backend: seg6 and seg6local routes via iproute2.

use std::sync::{Arc, RwLock};
use tracing::warn;

use srv6_rpc::Operation;
use srv6_types::{encode_behavior, BehaviorConfig, EncapMode, Sid, Srv6PathConfig, StatusCode};

use crate::commands;
use crate::iface::InterfaceCache;
use crate::manager::CommandRunner;
use crate::status_map::status_from_exec;

/// The encapsulation attribute set of one seg6 route, ready to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEncap {
    pub mode: EncapMode,
    /// Segment list in installation order, which is the reverse of the
    /// ingress-first order the caller supplied.
    pub segs: Vec<Sid>,
}

/// Builds the seg6 encapsulation attributes for a path.
///
/// The kernel stores SRH segments in reverse of travel order, so the list
/// is reversed here, immediately before the attribute set is built, and
/// nowhere else. An empty list becomes the unspecified address so a route
/// without segments can still be expressed.
pub fn build_path_encap(path: &Srv6PathConfig) -> PathEncap {
    let mut segs: Vec<Sid> = path.sr_path.iter().rev().copied().collect();
    if segs.is_empty() {
        segs.push(Sid::UNSPECIFIED);
    }
    PathEncap {
        mode: path.encap_mode,
        segs,
    }
}

/// Programs seg6/seg6local routes into the local kernel.
pub struct LinuxManager {
    runner: Arc<dyn CommandRunner>,
    ifaces: Arc<RwLock<InterfaceCache>>,
}

impl LinuxManager {
    pub fn new(runner: Arc<dyn CommandRunner>, ifaces: Arc<RwLock<InterfaceCache>>) -> Self {
        Self { runner, ifaces }
    }

    /// Applies one path operation to the kernel routing table.
    pub async fn apply_path(&self, operation: Operation, path: &Srv6PathConfig) -> StatusCode {
        let device = match self.resolve_path_device(operation, &path.device) {
            Ok(device) => device,
            Err(status) => return status,
        };
        let cmd = match operation {
            Operation::Add | Operation::Change => {
                let encap = build_path_encap(path);
                commands::seg6_route_cmd(
                    operation,
                    &path.destination,
                    encap.mode,
                    &encap.segs,
                    device.as_deref(),
                    path.table(),
                    path.metric(),
                )
            }
            Operation::Del => commands::route_del_cmd(
                &path.destination,
                device.as_deref(),
                path.table(),
                path.metric(),
            ),
            Operation::Get => return StatusCode::OperationNotSupported,
        };
        self.run(&cmd).await
    }

    /// Applies one behavior operation to the kernel routing table.
    pub async fn apply_behavior(
        &self,
        operation: Operation,
        behavior: &BehaviorConfig,
    ) -> StatusCode {
        let device = match self.resolve_behavior_device(&behavior.device) {
            Ok(device) => device,
            Err(status) => return status,
        };
        let cmd = match operation {
            Operation::Add | Operation::Change => match encode_behavior(behavior) {
                Ok(encap) => commands::seg6local_route_cmd(
                    operation,
                    &behavior.segment,
                    &encap,
                    &device,
                    behavior.table(),
                    behavior.metric(),
                ),
                Err(err) => {
                    warn!(segment = %behavior.segment, error = %err,
                          "Rejected seg6local behavior");
                    return err.status();
                }
            },
            // Deletion is keyed by the local segment alone; no attribute
            // payload is needed.
            Operation::Del => commands::seg6local_route_del_cmd(
                &behavior.segment,
                &device,
                behavior.table(),
                behavior.metric(),
            ),
            Operation::Get => return StatusCode::OperationNotSupported,
        };
        self.run(&cmd).await
    }

    /// Device for a path route: an explicit device must exist; an unset
    /// device falls back to the default egress only on add.
    fn resolve_path_device(
        &self,
        operation: Operation,
        device: &str,
    ) -> Result<Option<String>, StatusCode> {
        let ifaces = self.ifaces.read().unwrap_or_else(|e| e.into_inner());
        if !device.is_empty() {
            if ifaces.contains(device) {
                Ok(Some(device.to_string()))
            } else {
                warn!(device = %device, "Unknown device in path request");
                Err(StatusCode::NoSuchDevice)
            }
        } else if operation == Operation::Add {
            match ifaces.default_device() {
                Some(default) => Ok(Some(default.to_string())),
                None => {
                    warn!("No non-loopback interface available as default device");
                    Err(StatusCode::NoSuchDevice)
                }
            }
        } else {
            Ok(None)
        }
    }

    /// Device for a seg6local route: an unset device falls back to the
    /// default egress for every operation.
    fn resolve_behavior_device(&self, device: &str) -> Result<String, StatusCode> {
        let ifaces = self.ifaces.read().unwrap_or_else(|e| e.into_inner());
        if !device.is_empty() {
            if ifaces.contains(device) {
                Ok(device.to_string())
            } else {
                warn!(device = %device, "Unknown device in behavior request");
                Err(StatusCode::NoSuchDevice)
            }
        } else {
            match ifaces.default_device() {
                Some(default) => Ok(default.to_string()),
                None => {
                    warn!("No non-loopback interface available as default device");
                    Err(StatusCode::NoSuchDevice)
                }
            }
        }
    }

    async fn run(&self, cmd: &str) -> StatusCode {
        match self.runner.run(cmd).await {
            Ok(result) => status_from_exec(&result),
            Err(err) => {
                warn!(command = %cmd, error = %err, "Command execution failed");
                StatusCode::InternalError
            }
        }
    }
}
