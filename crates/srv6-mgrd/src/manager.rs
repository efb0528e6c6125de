//! The route programming manager: request dispatch and command execution.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

use srv6_rpc::{BehaviorRequest, Operation, PathRequest, Srv6Agent};
use srv6_types::{FwdEngine, StatusCode};

use crate::error::MgrResult;
use crate::iface::InterfaceCache;
use crate::linux::LinuxManager;
use crate::shell::{self, ExecResult};
use crate::vpp::VppManager;

/// Executes route programming commands.
///
/// The seam between the managers and the host: the real runner shells
/// out, the recording runner captures commands for tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &str) -> MgrResult<ExecResult>;
}

/// Runs commands through the local shell.
#[derive(Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, cmd: &str) -> MgrResult<ExecResult> {
        shell::exec(cmd).await
    }
}

/// Captures commands instead of executing them.
///
/// Results are popped from a queue; when the queue runs dry every command
/// "succeeds" with empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    results: Mutex<VecDeque<ExecResult>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result for the next command.
    pub fn push_result(&self, result: ExecResult) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, cmd: &str) -> MgrResult<ExecResult> {
        self.commands.lock().unwrap().push(cmd.to_string());
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ExecResult::ok("")))
    }
}

/// The per-node SRv6 manager.
///
/// Dispatches each request entry to the backend selected by its
/// forwarding engine and stops a batch at the first failure. `get` is not
/// supported for paths or behaviors.
pub struct Srv6Manager {
    linux: LinuxManager,
    vpp: VppManager,
    ifaces: Arc<RwLock<InterfaceCache>>,
}

impl Srv6Manager {
    /// Creates a manager that programs the local host.
    pub fn new(ifaces: InterfaceCache) -> Self {
        Self::with_runner(Arc::new(ShellRunner), ifaces)
    }

    /// Creates a manager with a custom command runner.
    pub fn with_runner(runner: Arc<dyn CommandRunner>, ifaces: InterfaceCache) -> Self {
        info!(
            non_loopback = ifaces.non_loopback().len(),
            loopback = ifaces.loopback().len(),
            default_device = ifaces.default_device().unwrap_or("<none>"),
            "Srv6Manager initialized"
        );
        let ifaces = Arc::new(RwLock::new(ifaces));
        Self {
            linux: LinuxManager::new(Arc::clone(&runner), Arc::clone(&ifaces)),
            vpp: VppManager::new(runner),
            ifaces,
        }
    }

    /// Re-enumerates the local interfaces on demand.
    pub async fn refresh_interfaces(&self) -> MgrResult<()> {
        let fresh = InterfaceCache::load().await?;
        let mut ifaces = self.ifaces.write().unwrap_or_else(|e| e.into_inner());
        *ifaces = fresh;
        info!("Interface cache refreshed");
        Ok(())
    }
}

#[async_trait]
impl Srv6Agent for Srv6Manager {
    async fn handle_path(&self, operation: Operation, request: PathRequest) -> StatusCode {
        debug!(operation = %operation, paths = request.paths.len(), engine = %request.fwd_engine,
               "Path request received");
        if operation == Operation::Get {
            return StatusCode::OperationNotSupported;
        }
        for path in &request.paths {
            let status = match request.fwd_engine {
                FwdEngine::Linux => self.linux.apply_path(operation, path).await,
                FwdEngine::Vpp => self.vpp.apply_path(operation, path).await,
            };
            if !status.is_success() {
                return status;
            }
        }
        StatusCode::Success
    }

    async fn handle_behavior(&self, operation: Operation, request: BehaviorRequest) -> StatusCode {
        debug!(operation = %operation, behaviors = request.behaviors.len(),
               engine = %request.fwd_engine, "Behavior request received");
        if operation == Operation::Get {
            return StatusCode::OperationNotSupported;
        }
        for behavior in &request.behaviors {
            let status = match request.fwd_engine {
                FwdEngine::Linux => self.linux.apply_behavior(operation, behavior).await,
                FwdEngine::Vpp => self.vpp.apply_behavior(operation, behavior).await,
            };
            if !status.is_success() {
                return status;
            }
        }
        StatusCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srv6_types::{BehaviorConfig, Seg6LocalAction, Sid, Srv6PathConfig};

    fn sid(addr: &str) -> Sid {
        addr.parse().unwrap()
    }

    fn test_manager() -> (Srv6Manager, Arc<RecordingRunner>) {
        let json = r#"[
            {"ifindex": 1, "ifname": "lo", "flags": ["LOOPBACK"]},
            {"ifindex": 2, "ifname": "eth0", "flags": ["BROADCAST"]}
        ]"#;
        let ifaces = InterfaceCache::from_json(json).unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let mgr = Srv6Manager::with_runner(runner.clone(), ifaces);
        (mgr, runner)
    }

    #[tokio::test]
    async fn test_get_is_not_supported() {
        let (mgr, _) = test_manager();
        let request = PathRequest::new(Vec::new(), FwdEngine::Linux);
        assert_eq!(
            mgr.handle_path(Operation::Get, request).await,
            StatusCode::OperationNotSupported
        );
        let request = BehaviorRequest::new(Vec::new(), FwdEngine::Linux);
        assert_eq!(
            mgr.handle_behavior(Operation::Get, request).await,
            StatusCode::OperationNotSupported
        );
    }

    #[tokio::test]
    async fn test_batch_stops_at_first_failure() {
        let (mgr, runner) = test_manager();
        runner.push_result(ExecResult::ok(""));
        runner.push_result(ExecResult::failed(2, "RTNETLINK answers: File exists"));

        let paths = vec![
            Srv6PathConfig::new("fd00:1::/64".parse().unwrap())
                .with_segments(vec![sid("fc00:1::1")]),
            Srv6PathConfig::new("fd00:2::/64".parse().unwrap())
                .with_segments(vec![sid("fc00:1::1")]),
            Srv6PathConfig::new("fd00:3::/64".parse().unwrap())
                .with_segments(vec![sid("fc00:1::1")]),
        ];
        let request = PathRequest::new(paths, FwdEngine::Linux);
        let status = mgr.handle_path(Operation::Add, request).await;
        assert_eq!(status, StatusCode::FileExists);
        // The third path was never attempted.
        assert_eq!(runner.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_engine_dispatch() {
        let (mgr, runner) = test_manager();
        let behavior = BehaviorConfig::new(sid("fc00:1::2")).with_action(Seg6LocalAction::End);
        let request = BehaviorRequest::single(behavior.clone(), FwdEngine::Linux);
        assert_eq!(
            mgr.handle_behavior(Operation::Add, request).await,
            StatusCode::Success
        );
        assert!(runner.commands()[0].starts_with("/sbin/ip"));

        let request = BehaviorRequest::single(behavior, FwdEngine::Vpp);
        assert_eq!(
            mgr.handle_behavior(Operation::Add, request).await,
            StatusCode::Success
        );
        assert!(runner.commands()[1].starts_with("/usr/bin/vppctl"));
    }
}
