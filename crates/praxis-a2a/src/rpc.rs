use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use praxis_identity::AgentCard;
use praxis_orchestrator::{Orchestrator, OrchestratorError, Plan, PlanStep};
use praxis_task::{Artifact, Message, MessageRole, Part, TaskManager, TaskStatus};

use crate::error::{A2aError, Result, INVALID_PARAMS, METHOD_NOT_FOUND};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0".into(), id, result: Some(result), error: None }
    }

    fn err(id: Value, error: A2aError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcErrorBody {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageSendParams {
    #[serde(default)]
    task_id: Option<Uuid>,
    originator: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct TaskIdParams {
    task_id: Uuid,
}

/// Implements the A2A JSON-RPC 2.0 method table: `message/send`,
/// `tasks/get`, `tasks/cancel`, and
/// `agent/getAuthenticatedExtendedCard`. Shared between the in-process P2P
/// handler and the HTTP surface so both speak exactly the same dispatch
/// logic.
pub struct A2aDispatcher {
    tasks: Arc<TaskManager>,
    local_card: AgentCard,
    orchestrator: Arc<Orchestrator>,
}

impl A2aDispatcher {
    pub fn new(tasks: Arc<TaskManager>, local_card: AgentCard, orchestrator: Arc<Orchestrator>) -> Self {
        Self { tasks, local_card, orchestrator }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        match self.dispatch(request).await {
            Ok(result) => JsonRpcResponse::ok(id, result),
            Err(error) => JsonRpcResponse::err(id, error),
        }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Result<Value> {
        match request.method.as_str() {
            "message/send" => self.message_send(request.params).await,
            "tasks/get" => self.tasks_get(request.params).await,
            "tasks/cancel" => self.tasks_cancel(request.params).await,
            "agent/getAuthenticatedExtendedCard" => self.get_extended_card().await,
            other => Err(A2aError::Rpc {
                code: METHOD_NOT_FOUND,
                message: format!("unknown method: {other}"),
            }),
        }
    }

    async fn message_send(&self, params: Value) -> Result<Value> {
        let params: MessageSendParams = serde_json::from_value(params).map_err(|e| A2aError::Rpc {
            code: INVALID_PARAMS,
            message: e.to_string(),
        })?;

        if params.text.trim().is_empty() {
            return Err(A2aError::Rpc {
                code: INVALID_PARAMS,
                message: "message must contain at least one non-empty text part".into(),
            });
        }

        let text = params.text.clone();
        let message = Message {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            parts: vec![Part::Text { text: params.text }],
            created_at: chrono::Utc::now(),
        };

        let (task, newly_created) = match params.task_id {
            Some(id) => (self.tasks.add_message(id, message).await?, false),
            None => (self.tasks.create_task(params.originator, message).await, true),
        };

        if newly_created {
            self.schedule(task.id, text);
        }

        Ok(serde_json::to_value(task).expect("task serializes"))
    }

    /// Parses `text` into a plan and drives it to completion in the
    /// background: `submitted → working`, runs the orchestrator, then
    /// `→ completed` with the result recorded as an artifact, or `→
    /// failed` with the error as the failure reason. A task canceled while
    /// the plan is in flight is left exactly as `cancel_task` already set
    /// it.
    fn schedule(&self, task_id: Uuid, text: String) {
        let tasks = self.tasks.clone();
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            let Ok(cancellation) = tasks.cancellation_token(task_id).await else {
                return;
            };
            if tasks.update_status(task_id, TaskStatus::Working).await.is_err() {
                return;
            }

            let plan = parse_utterance(&text);
            match orchestrator.run_plan(&plan, cancellation).await {
                Ok(results) => {
                    let artifact = Artifact {
                        id: Uuid::new_v4(),
                        name: "result".into(),
                        parts: vec![Part::Text { text: render_results(&results) }],
                        created_at: chrono::Utc::now(),
                    };
                    if tasks.add_artifact(task_id, artifact).await.is_ok() {
                        let _ = tasks.update_status(task_id, TaskStatus::Completed).await;
                    }
                }
                Err(OrchestratorError::Canceled) => {}
                Err(e) => {
                    let _ = tasks
                        .update_status(task_id, TaskStatus::Failed { reason: e.to_string() })
                        .await;
                }
            }
        });
    }

    async fn tasks_get(&self, params: Value) -> Result<Value> {
        let params: TaskIdParams = serde_json::from_value(params).map_err(|e| A2aError::Rpc {
            code: INVALID_PARAMS,
            message: e.to_string(),
        })?;
        let task = self.tasks.get_task(params.task_id).await?;
        Ok(serde_json::to_value(task).expect("task serializes"))
    }

    async fn tasks_cancel(&self, params: Value) -> Result<Value> {
        let params: TaskIdParams = serde_json::from_value(params).map_err(|e| A2aError::Rpc {
            code: INVALID_PARAMS,
            message: e.to_string(),
        })?;
        let task = self.tasks.cancel_task(params.task_id).await?;
        Ok(serde_json::to_value(task).expect("task serializes"))
    }

    async fn get_extended_card(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.local_card).expect("card serializes"))
    }
}

/// Recognizes the `CALL <tool> [args...]` surface syntax: a full DSL
/// lexer/parser is a separate collaborator this dispatcher only consumes
/// the output of, but a bare "CALL" line is unambiguous enough to build a
/// one-step plan from directly. Anything else becomes an empty plan, which
/// completes immediately with no artifacts.
fn parse_utterance(text: &str) -> Plan {
    let mut words = text.trim().split_whitespace();
    let steps = match words.next() {
        Some(head) if head.eq_ignore_ascii_case("call") => match words.next() {
            Some(tool) => {
                let rest = words.collect::<Vec<_>>().join(" ");
                let rest = rest.trim_matches('"');
                let arguments = if rest.is_empty() { Value::Object(Default::default()) } else { serde_json::json!({"text": rest}) };
                vec![PlanStep::Call { tool: tool.to_string(), arguments, retry: None }]
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    Plan::new(steps)
}

/// Renders a plan's step results into a single text artifact body,
/// pulling out `text` parts first since those are what a caller usually
/// wants to read, and falling back to the raw JSON otherwise.
fn render_results(results: &[Value]) -> String {
    let mut texts = Vec::new();
    collect_text(&Value::Array(results.to_vec()), &mut texts);
    if texts.is_empty() {
        serde_json::to_string(results).unwrap_or_default()
    } else {
        texts.join(" ")
    }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push(text.clone());
            } else {
                for v in map.values() {
                    collect_text(v, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}
