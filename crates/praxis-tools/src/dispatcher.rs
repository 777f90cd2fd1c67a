use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::tool::{ToolCall, ToolOutput};

/// Executes a tool call on some other agent in the mesh. Implemented by
/// `praxis-p2p`/`praxis-orchestrator`, which know how to find a peer that
/// advertises the tool and speak the tool-invocation wire protocol to it;
/// kept as a trait here so this crate never depends on the networking
/// stack.
#[async_trait]
pub trait RemoteToolExecutor: Send + Sync {
    async fn execute_remote(&self, call: ToolCall) -> Result<ToolOutput>;
}

/// Resolves a tool call to either the local registry or a remote
/// executor. A call whose name ends in `_external` always routes remotely,
/// regardless of whether a same-named local tool happens to exist;
/// everything else tries local first and falls back to remote only when
/// a remote executor is configured and the tool isn't registered locally.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    remote: Option<Arc<dyn RemoteToolExecutor>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, remote: Option<Arc<dyn RemoteToolExecutor>>) -> Self {
        Self { registry, remote }
    }

    pub async fn dispatch(&self, call: ToolCall) -> Result<ToolOutput> {
        if call.name.ends_with("_external") {
            return self.dispatch_remote(call).await;
        }

        if self.registry.get(&call.name).is_some() {
            return self.registry.execute(call).await;
        }

        self.dispatch_remote(call).await
    }

    async fn dispatch_remote(&self, call: ToolCall) -> Result<ToolOutput> {
        match &self.remote {
            Some(remote) => remote.execute_remote(call).await,
            None => Err(ToolError::NotFound(call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Tool, ToolOutputPart};
    use async_trait::async_trait as async_trait_attr;
    use serde_json::Value;

    struct LocalEcho;

    #[async_trait_attr]
    impl Tool for LocalEcho {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "local echo"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({})
        }
        async fn execute(&self, _call: ToolCall) -> Result<ToolOutput> {
            Ok(ToolOutput::ok("local"))
        }
    }

    struct StubRemote;

    #[async_trait_attr]
    impl RemoteToolExecutor for StubRemote {
        async fn execute_remote(&self, _call: ToolCall) -> Result<ToolOutput> {
            Ok(ToolOutput::ok("remote"))
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            name: name.into(),
            arguments: serde_json::json!(null),
        }
    }

    #[tokio::test]
    async fn prefers_local_tool_when_registered() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(LocalEcho)).unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), Some(Arc::new(StubRemote)));
        let output = dispatcher.dispatch(call("echo")).await.unwrap();
        assert_eq!(output.parts[0], ToolOutputPart::Text { text: "local".into() });
    }

    #[tokio::test]
    async fn falls_back_to_remote_when_not_registered_locally() {
        let registry = ToolRegistry::new();
        let dispatcher = Dispatcher::new(Arc::new(registry), Some(Arc::new(StubRemote)));
        let output = dispatcher.dispatch(call("search")).await.unwrap();
        assert_eq!(output.parts[0], ToolOutputPart::Text { text: "remote".into() });
    }

    #[tokio::test]
    async fn external_suffix_always_routes_remotely() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(LocalEcho)).unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), Some(Arc::new(StubRemote)));
        let output = dispatcher.dispatch(call("echo_external")).await.unwrap();
        assert_eq!(output.parts[0], ToolOutputPart::Text { text: "remote".into() });
    }

    #[tokio::test]
    async fn no_remote_executor_and_missing_local_tool_errors() {
        let registry = ToolRegistry::new();
        let dispatcher = Dispatcher::new(Arc::new(registry), None);
        let err = dispatcher.dispatch(call("missing")).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
