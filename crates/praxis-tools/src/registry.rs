use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, ToolError};
use crate::tool::{Tool, ToolCall, ToolDescriptor, ToolOutput};

/// Holds every tool a local agent can execute, keyed by name. Lookups are
/// read-mostly, so registration happens once at startup and execution
/// reads the map without locking out other callers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters_schema: tool.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, call: ToolCall) -> Result<ToolOutput> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolOutputPart;
    use async_trait::async_trait;
    use serde_json::Value;

    struct StaticTool(&'static str);

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "static test tool"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({})
        }
        async fn execute(&self, _call: ToolCall) -> Result<ToolOutput> {
            Ok(ToolOutput::ok("done"))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool("alpha"))).unwrap();
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool("alpha"))).unwrap();
        let err = registry.register(Arc::new(StaticTool("alpha"))).unwrap_err();
        assert!(matches!(err, ToolError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn execute_dispatches_to_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool("alpha"))).unwrap();
        let output = registry
            .execute(ToolCall {
                name: "alpha".into(),
                arguments: serde_json::json!(null),
            })
            .await
            .unwrap();
        assert_eq!(output.parts[0], ToolOutputPart::Text { text: "done".into() });
    }

    #[tokio::test]
    async fn execute_unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute(ToolCall {
                name: "missing".into(),
                arguments: serde_json::json!(null),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn descriptors_reflect_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool("alpha"))).unwrap();
        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "alpha");
    }
}
