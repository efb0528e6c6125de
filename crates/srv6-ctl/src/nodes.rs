//! Node identity registry: who the managed nodes are and how to reach
//! them.
//!
//! Each node carries its control-plane endpoint, its uN segment, its uDT
//! (decap) segment and its forwarding engine. The whole set is pushed and
//! pulled in bulk; persistence beyond the YAML file is somebody else's
//! job. The uSID policy orchestrator reads node records, it never writes
//! them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::RwLock;

use srv6_types::{FwdEngine, Sid, StatusCode};

use crate::error::{CtlError, CtlResult};

use srv6_types::usid::{DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS};

/// One managed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node name, the key used in policies.
    pub name: String,
    /// Control-plane address of the node's agent.
    pub grpc_ip: IpAddr,
    /// Control-plane port of the node's agent.
    pub grpc_port: u16,
    /// The node's uN segment.
    #[serde(rename = "uN")]
    pub un: Sid,
    /// The node's uDT (decap) segment, if it terminates tunnels.
    #[serde(rename = "uDT", default)]
    pub udt: Option<Sid>,
    /// Forwarding engine programming routes on the node.
    #[serde(default)]
    pub fwd_engine: FwdEngine,
}

/// The full nodes configuration pushed by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesConfig {
    /// Number of bits of the SID locator.
    #[serde(default = "default_locator_bits")]
    pub locator_bits: u8,
    /// Number of bits of a uSID identifier.
    #[serde(default = "default_usid_id_bits")]
    pub usid_id_bits: u8,
    /// Node records keyed by name.
    pub nodes: HashMap<String, NodeInfo>,
}

fn default_locator_bits() -> u8 {
    DEFAULT_LOCATOR_BITS
}

fn default_usid_id_bits() -> u8 {
    DEFAULT_USID_ID_BITS
}

impl NodesConfig {
    /// Checks internal consistency: field widths must fit an address and
    /// every record must be keyed by its own name.
    pub fn validate(&self) -> CtlResult<()> {
        if self.locator_bits == 0
            || self.usid_id_bits == 0
            || (self.locator_bits as u16) + 2 * (self.usid_id_bits as u16) > 128
        {
            return Err(CtlError::invalid_configuration(format!(
                "locator_bits {} and usid_id_bits {} do not fit an address",
                self.locator_bits, self.usid_id_bits
            )));
        }
        for (key, node) in &self.nodes {
            if key != &node.name {
                return Err(CtlError::invalid_configuration(format!(
                    "node keyed '{}' declares name '{}'",
                    key, node.name
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a YAML nodes configuration.
    pub fn from_yaml(yaml: &str) -> CtlResult<Self> {
        let config: NodesConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml(&self) -> CtlResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Loads and validates a nodes configuration file.
    pub async fn load(path: impl AsRef<Path>) -> CtlResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CtlError::ConfigIo {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml(&raw)
    }

    /// Writes the configuration to a file.
    pub async fn save(&self, path: impl AsRef<Path>) -> CtlResult<()> {
        let path = path.as_ref();
        let raw = self.to_yaml()?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|source| CtlError::ConfigIo {
                path: path.display().to_string(),
                source,
            })
    }

    /// Looks up a node by name.
    pub fn get(&self, name: &str) -> CtlResult<&NodeInfo> {
        self.nodes
            .get(name)
            .ok_or_else(|| CtlError::node_not_found(name))
    }
}

/// Holder for the pushed nodes configuration.
///
/// The registry is the bulk push/pull surface: an initial `push` refuses
/// to clobber an existing configuration, `update` replaces it, `pull`
/// returns a snapshot.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    config: RwLock<Option<NodesConfig>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the initial configuration. Fails with
    /// `STATUS_ALREADY_CONFIGURED` when one is present.
    pub fn push(&self, config: NodesConfig) -> StatusCode {
        let mut slot = self.config.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return StatusCode::AlreadyConfigured;
        }
        *slot = Some(config);
        StatusCode::Success
    }

    /// Replaces the configuration unconditionally.
    pub fn update(&self, config: NodesConfig) -> StatusCode {
        let mut slot = self.config.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(config);
        StatusCode::Success
    }

    /// Returns a snapshot of the configuration, if any.
    pub fn pull(&self) -> Option<NodesConfig> {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns true once a configuration has been pushed.
    pub fn is_configured(&self) -> bool {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
