use std::collections::HashMap;

use async_trait::async_trait;
use libp2p::PeerId;
use tokio::sync::RwLock;

use praxis_p2p::P2pHandle;
use praxis_tools::{RemoteToolExecutor, ToolCall, ToolError, ToolOutput, ToolOutputPart};

/// Bridges the orchestrator's `RemoteToolExecutor` trait to the P2P tool
/// invocation protocol: resolves which peer advertises a tool, then calls
/// it over `/agent/tool/invoke/1.0.0`.
pub struct P2pToolExecutor {
    handle: P2pHandle,
    tool_peers: RwLock<HashMap<String, PeerId>>,
}

impl P2pToolExecutor {
    pub fn new(handle: P2pHandle) -> Self {
        Self {
            handle,
            tool_peers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers which peer advertises `tool`, typically populated from
    /// Agent Card capabilities as cards are received.
    pub async fn register_tool_peer(&self, tool: impl Into<String>, peer: PeerId) {
        self.tool_peers.write().await.insert(tool.into(), peer);
    }
}

#[async_trait]
impl RemoteToolExecutor for P2pToolExecutor {
    async fn execute_remote(&self, call: ToolCall) -> praxis_tools::Result<ToolOutput> {
        let peer = *self
            .tool_peers
            .read()
            .await
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let request = praxis_p2p::protocol::ToolInvokeRequest {
            name: call.name.clone(),
            arguments: call.arguments,
        };
        let response = self
            .handle
            .invoke_tool(peer, request)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let parts = response
            .parts
            .into_iter()
            .map(|value| ToolOutputPart::Json { data: value })
            .collect();
        Ok(ToolOutput { success: response.success, parts })
    }
}
