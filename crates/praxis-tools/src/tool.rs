use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// An invocation of a registered tool: the tool's name plus its
/// JSON-encoded arguments, as carried over the tool-invocation wire
/// protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// A single piece of a tool's output: text or structured JSON. Kept
/// separate from `Part` in `praxis-task` because a tool's raw output and
/// the task message parts it ends up attached to are conceptually
/// distinct, even though they end up looking similar on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutputPart {
    Text { text: String },
    Json { data: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub parts: Vec<ToolOutputPart>,
}

impl ToolOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            parts: vec![ToolOutputPart::Text { text: text.into() }],
        }
    }

    pub fn ok_json(data: Value) -> Self {
        Self {
            success: true,
            parts: vec![ToolOutputPart::Json { data }],
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            success: false,
            parts: vec![ToolOutputPart::Text { text: text.into() }],
        }
    }
}

/// A capability a local agent can execute, either directly or by
/// delegating to an execution engine (container, remote MCP server).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, call: ToolCall) -> Result<ToolOutput>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input back"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, call: ToolCall) -> Result<ToolOutput> {
            Ok(ToolOutput::ok_json(call.arguments))
        }
    }

    #[tokio::test]
    async fn echo_tool_returns_its_arguments() {
        let tool = EchoTool;
        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({"x": 1}),
        };
        let output = tool.execute(call).await.unwrap();
        assert!(output.success);
        assert_eq!(
            output.parts[0],
            ToolOutputPart::Json {
                data: serde_json::json!({"x": 1})
            }
        );
    }
}
