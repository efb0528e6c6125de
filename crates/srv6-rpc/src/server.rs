//! Control protocol server: accept loop and per-connection dispatch.

use futures::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use srv6_types::StatusCode;

use crate::proto::{Srv6ManagerReply, Srv6ManagerRequest};
use crate::service::{dispatch, Srv6Agent};
use crate::wire;

/// Listens for controller connections and feeds decoded requests to a
/// [`Srv6Agent`].
///
/// A request that cannot be decoded is answered with
/// `STATUS_INVALID_GRPC_REQUEST`; a request carrying the wrong token is
/// answered with `STATUS_GRPC_UNAUTHORIZED`. Both keep the connection
/// open, since the framing stays intact.
pub struct AgentServer {
    listener: TcpListener,
    auth_token: Option<String>,
}

impl AgentServer {
    /// Binds the server socket.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            auth_token: None,
        })
    }

    /// Requires every request to carry this bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// The bound address, useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until the task is dropped.
    pub async fn serve(self, agent: Arc<dyn Srv6Agent>) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "Agent server listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(peer = %peer, "Controller connected");
            let agent = Arc::clone(&agent);
            let token = self.auth_token.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, agent, token).await {
                    warn!(peer = %peer, error = %err, "Connection error");
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    agent: Arc<dyn Srv6Agent>,
    auth_token: Option<String>,
) -> io::Result<()> {
    let mut framed = Framed::new(stream, wire::frame_codec());
    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let reply = match wire::decode_message::<Srv6ManagerRequest>(&frame) {
            Ok(request) => {
                if authorized(&auth_token, &request) {
                    dispatch(agent.as_ref(), request).await
                } else {
                    warn!("Request rejected: missing or wrong auth token");
                    Srv6ManagerReply::new(StatusCode::GrpcUnauthorized)
                }
            }
            Err(err) => {
                warn!(error = %err, "Request rejected: undecodable frame");
                Srv6ManagerReply::new(StatusCode::InvalidGrpcRequest)
            }
        };
        let payload = match wire::encode_message(&reply) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Failed to encode reply");
                break;
            }
        };
        framed.send(payload).await?;
    }
    Ok(())
}

fn authorized(expected: &Option<String>, request: &Srv6ManagerRequest) -> bool {
    match expected {
        Some(token) => request.auth_token.as_deref() == Some(token.as_str()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AgentClient;
    use crate::proto::{Operation, PathRequest, RequestBody};
    use crate::service::MockAgent;
    use srv6_types::{FwdEngine, Srv6PathConfig};
    use std::time::Duration;

    async fn spawn_server(agent: Arc<MockAgent>, token: Option<&str>) -> SocketAddr {
        let mut server = AgentServer::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        if let Some(token) = token {
            server = server.with_auth_token(token);
        }
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve(agent));
        addr
    }

    fn path_body() -> RequestBody {
        let path = Srv6PathConfig::new("fd00::/64".parse().unwrap())
            .with_segments(vec!["fc00:1::1".parse().unwrap()]);
        RequestBody::Path(PathRequest::single(path, FwdEngine::Linux))
    }

    #[tokio::test]
    async fn test_request_reply_over_loopback() {
        let agent = Arc::new(MockAgent::new());
        agent.push_path_reply(StatusCode::FileExists);
        let addr = spawn_server(Arc::clone(&agent), None).await;

        let client = AgentClient::new(addr);
        let status = client.call(Operation::Add, path_body()).await;
        assert_eq!(status, StatusCode::FileExists);
        assert_eq!(agent.path_calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let agent = Arc::new(MockAgent::new());
        let addr = spawn_server(Arc::clone(&agent), Some("secret")).await;

        let client = AgentClient::new(addr).with_auth_token("wrong");
        let status = client.call(Operation::Add, path_body()).await;
        assert_eq!(status, StatusCode::GrpcUnauthorized);
        // The agent was never consulted.
        assert_eq!(agent.path_calls(), 0);

        let client = AgentClient::new(addr).with_auth_token("secret");
        let status = client.call(Operation::Add, path_body()).await;
        assert_eq!(status, StatusCode::Success);
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_invalid_request() {
        let agent = Arc::new(MockAgent::new());
        let addr = spawn_server(agent, None).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut framed = Framed::new(stream, wire::frame_codec());
        framed
            .send(bytes::Bytes::from_static(b"{\"not\": \"a request\"}"))
            .await
            .unwrap();
        let frame = framed.next().await.unwrap().unwrap();
        let reply: Srv6ManagerReply = wire::decode_message(&frame).unwrap();
        assert_eq!(reply.status, StatusCode::InvalidGrpcRequest);
    }

    #[tokio::test]
    async fn test_unreachable_agent_maps_to_unavailable() {
        // Bind and immediately drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AgentClient::new(addr).with_timeout(Duration::from_millis(500));
        let status = client.call(Operation::Add, path_body()).await;
        assert_eq!(status, StatusCode::GrpcServiceUnavailable);
    }
}
