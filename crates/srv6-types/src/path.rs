//! seg6 path configuration: destination, segment list, encap mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::sid::{IpPrefix, Sid};

/// Sentinel for unset numeric parameters (table, metric, lookup table).
pub const UNSET: i32 = -1;

/// Encapsulation mode of a seg6 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncapMode {
    /// Outer IPv6 header with a full SRH.
    #[default]
    #[serde(rename = "encap")]
    Encap,
    /// SRH inserted into the original packet.
    #[serde(rename = "inline")]
    Inline,
    /// L2 frame encapsulated whole.
    #[serde(rename = "l2encap")]
    L2encap,
    /// Reduced encapsulation: the first segment is carried only in the
    /// destination address. Used by uSID policies.
    #[serde(rename = "encap.red")]
    EncapRed,
}

impl EncapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncapMode::Encap => "encap",
            EncapMode::Inline => "inline",
            EncapMode::L2encap => "l2encap",
            EncapMode::EncapRed => "encap.red",
        }
    }
}

impl fmt::Display for EncapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncapMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encap" => Ok(EncapMode::Encap),
            "inline" => Ok(EncapMode::Inline),
            "l2encap" => Ok(EncapMode::L2encap),
            "encap.red" => Ok(EncapMode::EncapRed),
            other => Err(ParseError::InvalidEncapMode(other.to_string())),
        }
    }
}

/// Forwarding engine programming the route on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FwdEngine {
    /// Linux kernel seg6/seg6local routes.
    #[default]
    #[serde(rename = "linux")]
    Linux,
    /// VPP SR policies and localsids.
    #[serde(rename = "vpp")]
    Vpp,
}

impl FwdEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            FwdEngine::Linux => "linux",
            FwdEngine::Vpp => "vpp",
        }
    }
}

impl fmt::Display for FwdEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FwdEngine {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(FwdEngine::Linux),
            "vpp" => Ok(FwdEngine::Vpp),
            other => Err(ParseError::InvalidFwdEngine(other.to_string())),
        }
    }
}

/// A seg6 steering path as requested by a client.
///
/// `table` and `metric` use the `-1` sentinel for "unset"; `device` uses
/// the empty string for "let the agent pick".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Srv6PathConfig {
    /// Destination prefix the path steers.
    pub destination: IpPrefix,
    /// Segment list in ingress-first order (the order a packet visits
    /// segments). May be empty only for delete and get.
    #[serde(default)]
    pub sr_path: Vec<Sid>,
    /// Device of the seg6 route; empty means the agent picks one on add.
    #[serde(default)]
    pub device: String,
    /// Encapsulation mode.
    #[serde(default)]
    pub encap_mode: EncapMode,
    /// Routing table of the route; -1 means the main table.
    #[serde(default = "unset")]
    pub table: i32,
    /// Metric of the route; -1 leaves the choice to the kernel.
    #[serde(default = "unset")]
    pub metric: i32,
    /// Binding SID of the path. Required by the VPP forwarding engine.
    #[serde(default)]
    pub bsid_addr: Option<Sid>,
}

fn unset() -> i32 {
    UNSET
}

impl Srv6PathConfig {
    pub fn new(destination: IpPrefix) -> Self {
        Self {
            destination,
            sr_path: Vec::new(),
            device: String::new(),
            encap_mode: EncapMode::default(),
            table: UNSET,
            metric: UNSET,
            bsid_addr: None,
        }
    }

    pub fn with_segments(mut self, segments: Vec<Sid>) -> Self {
        self.sr_path = segments;
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_encap_mode(mut self, mode: EncapMode) -> Self {
        self.encap_mode = mode;
        self
    }

    pub fn with_table(mut self, table: i32) -> Self {
        self.table = table;
        self
    }

    pub fn with_metric(mut self, metric: i32) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_bsid(mut self, bsid: Sid) -> Self {
        self.bsid_addr = Some(bsid);
        self
    }

    /// Routing table, with the sentinel resolved to `None`.
    pub fn table(&self) -> Option<u32> {
        u32::try_from(self.table).ok()
    }

    /// Metric, with the sentinel resolved to `None`.
    pub fn metric(&self) -> Option<u32> {
        u32::try_from(self.metric).ok()
    }
}
