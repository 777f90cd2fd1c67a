use rmcp::model::CallToolRequestParam;
use rmcp::transport::{SseClientTransport, StreamableHttpClientTransport};
use rmcp::ServiceExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ToolError};

/// Which wire transport to use when talking to an external MCP server.
/// Streamable HTTP is the default per the runtime's external-tool policy;
/// SSE remains available for servers that haven't migrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteMcpTransport {
    StreamableHttp { url: String },
    Sse { url: String },
}

/// Invokes a single tool on an external MCP server, opening and tearing
/// down the connection per call. Connection reuse across calls is left to
/// a future pooling layer; the dispatcher only needs correctness here.
pub struct RemoteMcpEngine;

impl RemoteMcpEngine {
    pub fn new() -> Self {
        Self
    }

    pub async fn call_tool(
        &self,
        transport: &RemoteMcpTransport,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value> {
        debug!(tool = tool_name, ?transport, "calling remote mcp tool");
        let arguments = arguments.as_object().cloned();

        let result = match transport {
            RemoteMcpTransport::StreamableHttp { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                let client = ()
                    .serve(transport)
                    .await
                    .map_err(|e| ToolError::RemoteMcp(format!("connect failed: {e}")))?;
                let result = client
                    .call_tool(CallToolRequestParam {
                        meta: None,
                        name: tool_name.to_string().into(),
                        arguments,
                        task: None,
                    })
                    .await
                    .map_err(|e| ToolError::RemoteMcp(format!("call_tool failed: {e}")));
                let _ = client.cancel().await;
                result?
            }
            RemoteMcpTransport::Sse { url } => {
                let transport = SseClientTransport::start(url.clone())
                    .await
                    .map_err(|e| ToolError::RemoteMcp(format!("sse connect failed: {e}")))?;
                let client = ()
                    .serve(transport)
                    .await
                    .map_err(|e| ToolError::RemoteMcp(format!("connect failed: {e}")))?;
                let result = client
                    .call_tool(CallToolRequestParam {
                        meta: None,
                        name: tool_name.to_string().into(),
                        arguments,
                        task: None,
                    })
                    .await
                    .map_err(|e| ToolError::RemoteMcp(format!("call_tool failed: {e}")));
                let _ = client.cancel().await;
                result?
            }
        };

        serde_json::to_value(result.content)
            .map_err(|e| ToolError::RemoteMcp(format!("result encoding failed: {e}")))
    }
}

impl Default for RemoteMcpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_streamable_http_endpoint_surfaces_remote_mcp_error() {
        let engine = RemoteMcpEngine::new();
        let transport = RemoteMcpTransport::StreamableHttp {
            url: "http://127.0.0.1:1/mcp".into(),
        };
        let err = engine
            .call_tool(&transport, "whatever", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::RemoteMcp(_)));
    }
}
