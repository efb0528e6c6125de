//! Request and reply message shapes of the control protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use srv6_types::{BehaviorConfig, FwdEngine, Srv6PathConfig, StatusCode};

/// The operation carried out-of-band next to a request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Create the entity (`Create` on the RPC surface).
    #[serde(rename = "add")]
    Add,
    /// Read the entity (`Get`).
    #[serde(rename = "get")]
    Get,
    /// Update the entity in place (`Update`).
    #[serde(rename = "change")]
    Change,
    /// Remove the entity (`Remove`).
    #[serde(rename = "del")]
    Del,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Get => "get",
            Operation::Change => "change",
            Operation::Del => "del",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Operation::Add),
            "get" => Ok(Operation::Get),
            "change" => Ok(Operation::Change),
            "del" => Ok(Operation::Del),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// A batch of seg6 paths to program with one forwarding engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRequest {
    pub paths: Vec<Srv6PathConfig>,
    #[serde(default)]
    pub fwd_engine: FwdEngine,
}

impl PathRequest {
    pub fn new(paths: Vec<Srv6PathConfig>, fwd_engine: FwdEngine) -> Self {
        Self { paths, fwd_engine }
    }

    pub fn single(path: Srv6PathConfig, fwd_engine: FwdEngine) -> Self {
        Self::new(vec![path], fwd_engine)
    }
}

/// A batch of seg6local behaviors to program with one forwarding engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRequest {
    pub behaviors: Vec<BehaviorConfig>,
    #[serde(default)]
    pub fwd_engine: FwdEngine,
}

impl BehaviorRequest {
    pub fn new(behaviors: Vec<BehaviorConfig>, fwd_engine: FwdEngine) -> Self {
        Self {
            behaviors,
            fwd_engine,
        }
    }

    pub fn single(behavior: BehaviorConfig, fwd_engine: FwdEngine) -> Self {
        Self::new(vec![behavior], fwd_engine)
    }
}

/// The payload of one request: paths or behaviors, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request")]
pub enum RequestBody {
    #[serde(rename = "srv6_path")]
    Path(PathRequest),
    #[serde(rename = "srv6_behavior")]
    Behavior(BehaviorRequest),
}

/// One framed request to a node agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Srv6ManagerRequest {
    pub operation: Operation,
    /// Bearer token checked by agents that require authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl Srv6ManagerRequest {
    pub fn new(operation: Operation, body: RequestBody) -> Self {
        Self {
            operation,
            auth_token: None,
            body,
        }
    }
}

/// The reply to any request: a bare status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Srv6ManagerReply {
    pub status: StatusCode,
}

impl Srv6ManagerReply {
    pub fn new(status: StatusCode) -> Self {
        Self { status }
    }
}
