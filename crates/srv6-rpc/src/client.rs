//! Control protocol client.
//!
//! One connection per call: connect, send the request, await the reply,
//! all under a single deadline. Transport failures never reach the
//! orchestration layer as errors; they are folded into the status
//! taxonomy so a dead agent and a rejected operation travel the same way.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use srv6_types::StatusCode;

use crate::error::RpcError;
use crate::proto::{
    BehaviorRequest, Operation, PathRequest, RequestBody, Srv6ManagerReply, Srv6ManagerRequest,
};
use crate::service::Srv6Agent;
use crate::wire;

/// Deadline applied to a call when the caller does not pick one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one node agent, addressed by its control-plane endpoint.
#[derive(Debug, Clone)]
pub struct AgentClient {
    addr: SocketAddr,
    request_timeout: Duration,
    auth_token: Option<String>,
}

impl AgentClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
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

    /// Address of the agent this client talks to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sends one request and returns the agent's reply, surfacing
    /// transport failures as errors.
    pub async fn request(
        &self,
        operation: Operation,
        body: RequestBody,
    ) -> Result<Srv6ManagerReply, RpcError> {
        let mut request = Srv6ManagerRequest::new(operation, body);
        request.auth_token = self.auth_token.clone();
        match timeout(self.request_timeout, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout {
                addr: self.addr,
                timeout: self.request_timeout,
            }),
        }
    }

    async fn exchange(&self, request: &Srv6ManagerRequest) -> Result<Srv6ManagerReply, RpcError> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| RpcError::Connect {
                addr: self.addr,
                source,
            })?;
        let mut framed = Framed::new(stream, wire::frame_codec());
        framed.send(wire::encode_message(request)?).await?;
        let frame = framed.next().await.ok_or(RpcError::ConnectionClosed)??;
        let reply: Srv6ManagerReply = wire::decode_message(&frame)?;
        debug!(agent = %self.addr, operation = %request.operation, status = ?reply.status,
               "Agent replied");
        Ok(reply)
    }

    /// Sends one request and folds transport failures into the status
    /// taxonomy.
    pub async fn call(&self, operation: Operation, body: RequestBody) -> StatusCode {
        match self.request(operation, body).await {
            Ok(reply) => reply.status,
            Err(err) => {
                warn!(agent = %self.addr, operation = %operation, error = %err,
                      "Agent call failed at the transport layer");
                err.status()
            }
        }
    }
}

#[async_trait]
impl Srv6Agent for AgentClient {
    async fn handle_path(&self, operation: Operation, request: PathRequest) -> StatusCode {
        self.call(operation, RequestBody::Path(request)).await
    }

    async fn handle_behavior(&self, operation: Operation, request: BehaviorRequest) -> StatusCode {
        self.call(operation, RequestBody::Behavior(request)).await
    }
}
