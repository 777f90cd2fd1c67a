use praxis_identity::AgentCard;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request half of the card-exchange protocol (`/agent/card/1.0.0`). Empty
/// today; kept as a struct so a future revision can add a requested-fields
/// filter without breaking the wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardExchangeRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardExchangeResponse {
    pub card: AgentCard,
}

/// Wire shape for a tool invocation (`/agent/tool/invoke/1.0.0`). Mirrors
/// `praxis_tools::ToolCall` field-for-field but is defined independently
/// so this crate never needs to depend on the tool-execution stack; the
/// dispatcher converts between the two at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeRequest {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeResponse {
    pub success: bool,
    pub parts: Vec<Value>,
}

/// A2A JSON-RPC 2.0 payloads (`/agent/a2a/1.0.0`) pass through verbatim —
/// the method table lives in `praxis-a2a`, this crate only transports the
/// request/response bytes.
pub type A2aRequest = Value;
pub type A2aResponse = Value;
