//! The service seam of the control protocol.
//!
//! [`Srv6Agent`] is implemented on the node side by the route programming
//! manager and on the controller side by [`AgentClient`](crate::client::AgentClient),
//! so orchestration code is written once against the trait and runs
//! unchanged against a remote agent or an in-process mock.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use srv6_types::StatusCode;

use crate::proto::{
    BehaviorRequest, Operation, PathRequest, RequestBody, Srv6ManagerReply, Srv6ManagerRequest,
};

/// A route programming agent, local or remote.
#[async_trait]
pub trait Srv6Agent: Send + Sync {
    /// Applies a path operation and reports its outcome.
    async fn handle_path(&self, operation: Operation, request: PathRequest) -> StatusCode;

    /// Applies a behavior operation and reports its outcome.
    async fn handle_behavior(&self, operation: Operation, request: BehaviorRequest) -> StatusCode;
}

/// Routes a decoded request to the matching handler of an agent.
pub async fn dispatch(agent: &dyn Srv6Agent, request: Srv6ManagerRequest) -> Srv6ManagerReply {
    let status = match request.body {
        RequestBody::Path(body) => agent.handle_path(request.operation, body).await,
        RequestBody::Behavior(body) => agent.handle_behavior(request.operation, body).await,
    };
    Srv6ManagerReply::new(status)
}

/// One call recorded by [`MockAgent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Path {
        operation: Operation,
        request: PathRequest,
    },
    Behavior {
        operation: Operation,
        request: BehaviorRequest,
    },
}

/// Scripted agent for tests.
///
/// Replies are popped from per-handler queues; when a queue runs dry the
/// agent keeps answering `STATUS_SUCCESS`. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockAgent {
    path_replies: Mutex<VecDeque<StatusCode>>,
    behavior_replies: Mutex<VecDeque<StatusCode>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next path call.
    pub fn push_path_reply(&self, status: StatusCode) {
        self.path_replies.lock().unwrap().push_back(status);
    }

    /// Queues a reply for the next behavior call.
    pub fn push_behavior_reply(&self, status: StatusCode) {
        self.behavior_replies.lock().unwrap().push_back(status);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of path calls received.
    pub fn path_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, MockCall::Path { .. }))
            .count()
    }

    /// Number of behavior calls received.
    pub fn behavior_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, MockCall::Behavior { .. }))
            .count()
    }
}

#[async_trait]
impl Srv6Agent for MockAgent {
    async fn handle_path(&self, operation: Operation, request: PathRequest) -> StatusCode {
        self.calls.lock().unwrap().push(MockCall::Path {
            operation,
            request,
        });
        self.path_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusCode::Success)
    }

    async fn handle_behavior(&self, operation: Operation, request: BehaviorRequest) -> StatusCode {
        self.calls.lock().unwrap().push(MockCall::Behavior {
            operation,
            request,
        });
        self.behavior_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srv6_types::{FwdEngine, Srv6PathConfig};

    #[tokio::test]
    async fn test_dispatch_routes_by_body() {
        let agent = MockAgent::new();
        agent.push_path_reply(StatusCode::FileExists);

        let path = Srv6PathConfig::new("fd00::/64".parse().unwrap());
        let request = Srv6ManagerRequest::new(
            Operation::Add,
            RequestBody::Path(PathRequest::single(path, FwdEngine::Linux)),
        );
        let reply = dispatch(&agent, request).await;
        assert_eq!(reply.status, StatusCode::FileExists);
        assert_eq!(agent.path_calls(), 1);
        assert_eq!(agent.behavior_calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_defaults_to_success() {
        let agent = MockAgent::new();
        let request = BehaviorRequest::new(Vec::new(), FwdEngine::Linux);
        let status = agent.handle_behavior(Operation::Del, request).await;
        assert_eq!(status, StatusCode::Success);
    }
}
