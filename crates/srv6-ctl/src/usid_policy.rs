//! uSID policy orchestration.
//!
//! A uSID policy steers traffic between two endpoint nodes through named
//! waypoints. Node names resolve to uN segments through the node
//! registry; the egress node's uDT segment becomes the decap group; the
//! whole list is compressed into micro-segment blocks and installed as a
//! reduced-encapsulation seg6 path in each direction, through the ingress
//! node of that direction.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use srv6_rpc::{AgentClient, Operation, Srv6Agent, DEFAULT_REQUEST_TIMEOUT};
use srv6_types::usid::{compress_list_with_decap, locator_mask};
use srv6_types::{EncapMode, FwdEngine, IpPrefix, Sid, Srv6PathConfig, StatusCode, UNSET};

use crate::error::{CtlError, CtlResult};
use crate::nodes::{NodeInfo, NodeRegistry, NodesConfig};
use crate::tunnel::handle_srv6_path;

/// A uSID policy between two endpoint nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsidPolicy {
    /// Destination prefix of the left-to-right path.
    pub lr_destination: IpPrefix,
    /// Destination prefix of the right-to-left path.
    pub rl_destination: IpPrefix,
    /// Waypoints of the left-to-right path, endpoint nodes included.
    pub nodes_lr: Vec<String>,
    /// Waypoints of the right-to-left path. When omitted, the reverse of
    /// the left-to-right list is used (symmetric path).
    pub nodes_rl: Option<Vec<String>>,
    /// Routing table for the installed routes; -1 means the main table.
    pub table: i32,
    /// Metric for the installed routes; -1 leaves the choice to the node.
    pub metric: i32,
}

impl UsidPolicy {
    pub fn new(
        lr_destination: IpPrefix,
        rl_destination: IpPrefix,
        nodes_lr: Vec<String>,
    ) -> Self {
        Self {
            lr_destination,
            rl_destination,
            nodes_lr,
            nodes_rl: None,
            table: UNSET,
            metric: UNSET,
        }
    }

    pub fn with_nodes_rl(mut self, nodes_rl: Vec<String>) -> Self {
        self.nodes_rl = Some(nodes_rl);
        self
    }
}

/// Opens control-protocol sessions to nodes.
///
/// The orchestration logic only needs "an agent for this node"; tests
/// substitute in-process agents here.
pub trait AgentConnector: Send + Sync {
    fn connect(&self, node: &NodeInfo) -> Arc<dyn Srv6Agent>;
}

/// Connects to node agents over TCP.
#[derive(Debug, Clone)]
pub struct TcpAgentConnector {
    request_timeout: Duration,
    auth_token: Option<String>,
}

impl TcpAgentConnector {
    pub fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_token: None,
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl Default for TcpAgentConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentConnector for TcpAgentConnector {
    fn connect(&self, node: &NodeInfo) -> Arc<dyn Srv6Agent> {
        let mut client = AgentClient::new(SocketAddr::new(node.grpc_ip, node.grpc_port))
            .with_timeout(self.request_timeout);
        if let Some(token) = &self.auth_token {
            client = client.with_auth_token(token.clone());
        }
        Arc::new(client)
    }
}

/// Generates a binding SID for a VPP policy from its destination.
///
/// The destination's hex digits, stripped of zeros and separators, are
/// regrouped into an IPv6 address. Distinct destinations can collide
/// (`fcff:1::` and `fcff::1` squeeze to the same digits); acceptable for
/// the policies this controller generates.
pub fn generate_bsid_addr(destination: &IpPrefix) -> CtlResult<Sid> {
    let squeezed: String = destination
        .addr()
        .to_string()
        .chars()
        .filter(|c| *c != '0' && *c != ':' && *c != '.')
        .collect();
    let groups: Vec<String> = squeezed
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect();
    let mut bsid = groups.join(":");
    // Short addresses need the trailing zero-run marker to be valid.
    if squeezed.len() <= 28 {
        bsid.push_str("::");
    }
    bsid.parse().map_err(|_| {
        CtlError::invalid_argument(format!(
            "cannot derive a binding SID from destination {}",
            destination
        ))
    })
}

/// Derives the uDT decap SID pair from the egress node's uDT segment.
///
/// The first pair member keeps the uDT's first identifier; the second
/// promotes the uDT's second identifier into the first identifier slot.
fn derive_udt_sids(udt: Sid, locator_bits: u8, usid_id_bits: u8) -> CtlResult<Vec<Sid>> {
    let lb = locator_bits as u32;
    let ib = usid_id_bits as u32;
    if lb + 2 * ib > 128 {
        return Err(CtlError::invalid_configuration(format!(
            "locator_bits {} and usid_id_bits {} leave no room for a uDT pair",
            locator_bits, usid_id_bits
        )));
    }
    let bits = udt.bits();
    let locator = bits & locator_mask(locator_bits);
    let id_mask = (1u128 << ib) - 1;
    let first_id = (bits >> (128 - lb - ib)) & id_mask;
    let second_id = (bits >> (128 - lb - 2 * ib)) & id_mask;
    Ok(vec![
        Sid::from_bits(locator | (first_id << (128 - lb - ib))),
        Sid::from_bits(locator | (second_id << (128 - lb - ib))),
    ])
}

/// Installs or removes one direction of a uSID policy through the
/// direction's ingress node.
async fn handle_usid_direction(
    operation: Operation,
    connector: &dyn AgentConnector,
    config: &NodesConfig,
    nodes: &[&NodeInfo],
    destination: IpPrefix,
    table: i32,
    metric: i32,
) -> CtlResult<StatusCode> {
    let ingress = nodes
        .first()
        .ok_or_else(|| CtlError::invalid_argument("empty node list"))?;
    let egress = nodes
        .last()
        .ok_or_else(|| CtlError::invalid_argument("empty node list"))?;
    let egress_udt = egress.udt.ok_or_else(|| {
        CtlError::invalid_configuration(format!("node '{}' has no uDT segment", egress.name))
    })?;

    // The ingress node imposes the encapsulation, so its own uN is not
    // part of the carried list. The egress uN and the uDT pair form the
    // decap group, which may not be split across blocks.
    let un_sids: Vec<Sid> = nodes[1..].iter().map(|node| node.un).collect();
    let inner = &un_sids[..un_sids.len() - 1];
    let mut decap_sids = vec![un_sids[un_sids.len() - 1]];
    decap_sids.extend(derive_udt_sids(
        egress_udt,
        config.locator_bits,
        config.usid_id_bits,
    )?);

    let usid_list = match compress_list_with_decap(
        inner,
        &decap_sids,
        config.locator_bits,
        config.usid_id_bits,
    ) {
        Ok(usid_list) => usid_list,
        Err(err) => {
            warn!(destination = %destination, error = %err, "uSID compression failed");
            return Ok(StatusCode::InternalError);
        }
    };
    info!(destination = %destination, ingress = %ingress.name, egress = %egress.name,
          blocks = usid_list.len(), "Handling uSID policy direction");

    let mut path = Srv6PathConfig::new(destination)
        .with_segments(usid_list)
        .with_encap_mode(EncapMode::EncapRed)
        .with_table(table)
        .with_metric(metric);
    if ingress.fwd_engine == FwdEngine::Vpp {
        let bsid = generate_bsid_addr(&destination)?;
        path = path.with_bsid(bsid);
    }
    let agent = connector.connect(ingress);
    handle_srv6_path(agent.as_ref(), operation, path, ingress.fwd_engine).await
}

/// Adds or removes a uSID policy: both directions, left-to-right first.
///
/// The first non-success status stops the operation; an already-installed
/// direction is not compensated.
pub async fn handle_srv6_usid_policy(
    operation: Operation,
    connector: &dyn AgentConnector,
    registry: &NodeRegistry,
    policy: &UsidPolicy,
) -> CtlResult<StatusCode> {
    match operation {
        Operation::Add | Operation::Del => {}
        Operation::Get | Operation::Change => return Ok(StatusCode::OperationNotSupported),
    }
    let Some(config) = registry.pull() else {
        warn!("uSID policy requested before a nodes configuration was pushed");
        return Ok(StatusCode::NotConfigured);
    };

    if policy.nodes_lr.len() < 2 {
        return Err(CtlError::invalid_argument(
            "a uSID policy needs at least the two endpoint nodes",
        ));
    }
    // Symmetric path unless the caller provided the reverse direction.
    let nodes_rl: Vec<String> = match &policy.nodes_rl {
        Some(nodes_rl) => nodes_rl.clone(),
        None => policy.nodes_lr.iter().rev().cloned().collect(),
    };
    // The two directions must connect the same pair of endpoints.
    if policy.nodes_lr.first() != nodes_rl.last() || nodes_rl.first() != policy.nodes_lr.last() {
        return Err(CtlError::invalid_argument("Bad tunnel endpoints"));
    }

    let lr_nodes: Vec<&NodeInfo> = policy
        .nodes_lr
        .iter()
        .map(|name| config.get(name))
        .collect::<CtlResult<_>>()?;
    let rl_nodes: Vec<&NodeInfo> = nodes_rl
        .iter()
        .map(|name| config.get(name))
        .collect::<CtlResult<_>>()?;

    let status = handle_usid_direction(
        operation,
        connector,
        &config,
        &lr_nodes,
        policy.lr_destination,
        policy.table,
        policy.metric,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    let status = handle_usid_direction(
        operation,
        connector,
        &config,
        &rl_nodes,
        policy.rl_destination,
        policy.table,
        policy.metric,
    )
    .await?;
    if !status.is_success() {
        return Ok(status);
    }
    Ok(StatusCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use srv6_rpc::{MockAgent, MockCall};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const TOPOLOGY_YAML: &str = r#"
locator_bits: 32
usid_id_bits: 16
nodes:
  R1:
    name: R1
    grpc_ip: "fcff:1::1"
    grpc_port: 12345
    uN: "fcbb:bb00:0001::"
    uDT: "fcbb:bb00:0001:0d01::"
    fwd_engine: linux
  R2:
    name: R2
    grpc_ip: "fcff:2::1"
    grpc_port: 12345
    uN: "fcbb:bb00:0002::"
    uDT: "fcbb:bb00:0002:0d02::"
    fwd_engine: linux
  R3:
    name: R3
    grpc_ip: "fcff:3::1"
    grpc_port: 12345
    uN: "fcbb:bb00:0003::"
    uDT: "fcbb:bb00:0003:0d03::"
    fwd_engine: linux
  R4:
    name: R4
    grpc_ip: "fcff:4::1"
    grpc_port: 12345
    uN: "fcbb:bb00:0004::"
    uDT: "fcbb:bb00:0004:0d04::"
    fwd_engine: linux
"#;

    /// Hands out one shared mock agent per node name.
    #[derive(Default)]
    struct MockConnector {
        agents: Mutex<HashMap<String, Arc<MockAgent>>>,
    }

    impl MockConnector {
        fn agent(&self, name: &str) -> Arc<MockAgent> {
            self.agents
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_default()
                .clone()
        }
    }

    impl AgentConnector for MockConnector {
        fn connect(&self, node: &NodeInfo) -> Arc<dyn Srv6Agent> {
            self.agent(&node.name)
        }
    }

    fn registry() -> NodeRegistry {
        let registry = NodeRegistry::new();
        registry.push(NodesConfig::from_yaml(TOPOLOGY_YAML).unwrap());
        registry
    }

    fn policy() -> UsidPolicy {
        UsidPolicy::new(
            "fd00:4::/64".parse().unwrap(),
            "fd00:1::/64".parse().unwrap(),
            vec![
                "R1".to_string(),
                "R2".to_string(),
                "R3".to_string(),
                "R4".to_string(),
            ],
        )
    }

    fn sid(addr: &str) -> Sid {
        addr.parse().unwrap()
    }

    #[test]
    fn test_derive_udt_sids() {
        let pair = derive_udt_sids(sid("fcbb:bb00:0004:0d04::"), 32, 16).unwrap();
        // First id kept in place, second id promoted into the first slot.
        assert_eq!(
            pair,
            vec![sid("fcbb:bb00:0004::"), sid("fcbb:bb00:0d04::")]
        );
    }

    #[test]
    fn test_generate_bsid_addr() {
        let bsid = generate_bsid_addr(&"fcbb:bb00:0001::".parse().unwrap()).unwrap();
        assert_eq!(bsid, sid("fcbb:bb1::"));
    }

    #[tokio::test]
    async fn test_policy_installs_both_directions() {
        let connector = MockConnector::default();
        let registry = registry();
        let status = handle_srv6_usid_policy(
            Operation::Add,
            &connector,
            &registry,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::Success);

        // Left-to-right goes through R1, right-to-left through R4; the
        // intermediate nodes see no calls at all.
        let r1 = connector.agent("R1");
        let r4 = connector.agent("R4");
        assert_eq!(r1.path_calls(), 1);
        assert_eq!(r4.path_calls(), 1);
        assert_eq!(connector.agent("R2").path_calls(), 0);
        assert_eq!(connector.agent("R3").path_calls(), 0);

        // The carried list skips the ingress uN and packs the egress uN
        // plus the uDT pair into one reduced-encap block.
        let calls = r1.calls();
        let MockCall::Path { operation, request } = &calls[0] else {
            panic!("expected a path call");
        };
        assert_eq!(*operation, Operation::Add);
        let path = &request.paths[0];
        assert_eq!(path.encap_mode, EncapMode::EncapRed);
        assert_eq!(
            path.sr_path,
            vec![sid("fcbb:bb00:0002:0003:0004:0004:0d04::")]
        );

        let calls = r4.calls();
        let MockCall::Path { request, .. } = &calls[0] else {
            panic!("expected a path call");
        };
        assert_eq!(
            request.paths[0].sr_path,
            vec![sid("fcbb:bb00:0003:0002:0001:0001:0d01::")]
        );
    }

    #[tokio::test]
    async fn test_policy_del_reaches_both_ingresses() {
        let connector = MockConnector::default();
        let registry = registry();
        let status = handle_srv6_usid_policy(
            Operation::Del,
            &connector,
            &registry,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::Success);
        let calls = connector.agent("R1").calls();
        let MockCall::Path { operation, .. } = &calls[0] else {
            panic!("expected a path call");
        };
        assert_eq!(*operation, Operation::Del);
        assert_eq!(connector.agent("R4").path_calls(), 1);
    }

    #[tokio::test]
    async fn test_policy_without_configuration() {
        let connector = MockConnector::default();
        let registry = NodeRegistry::new();
        let status = handle_srv6_usid_policy(
            Operation::Add,
            &connector,
            &registry,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NotConfigured);
    }

    #[tokio::test]
    async fn test_policy_unknown_node() {
        let connector = MockConnector::default();
        let registry = registry();
        let mut bad = policy();
        bad.nodes_lr[1] = "R9".to_string();
        let err = handle_srv6_usid_policy(Operation::Add, &connector, &registry, &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, CtlError::NodeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_policy_endpoint_mismatch() {
        let connector = MockConnector::default();
        let registry = registry();
        let bad = policy().with_nodes_rl(vec![
            "R3".to_string(),
            "R2".to_string(),
            "R1".to_string(),
        ]);
        let err = handle_srv6_usid_policy(Operation::Add, &connector, &registry, &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, CtlError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_policy_first_direction_failure_stops() {
        let connector = MockConnector::default();
        let registry = registry();
        connector
            .agent("R1")
            .push_path_reply(StatusCode::GrpcServiceUnavailable);
        let status = handle_srv6_usid_policy(
            Operation::Add,
            &connector,
            &registry,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::GrpcServiceUnavailable);
        // The reverse direction was never attempted.
        assert_eq!(connector.agent("R4").path_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_and_change_are_not_supported() {
        let connector = MockConnector::default();
        let registry = registry();
        for operation in [Operation::Get, Operation::Change] {
            let status = handle_srv6_usid_policy(operation, &connector, &registry, &policy())
                .await
                .unwrap();
            assert_eq!(status, StatusCode::OperationNotSupported);
        }
    }
}
