use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A step's opt-in retry annotation. Absent by default: per §4.8, the
/// orchestrator retries nothing unless the plan says so.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAnnotation {
    pub max_attempts: u32,
    #[serde(with = "duration_millis")]
    pub backoff: Duration,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// One step of a parsed plan. The lexer/parser that turns a DSL program
/// into this structure lives outside this crate; the orchestrator only
/// consumes the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStep {
    Call {
        tool: String,
        arguments: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry: Option<RetryAnnotation>,
    },
    Branch {
        condition: Value,
        then_steps: Vec<PlanStep>,
        else_steps: Vec<PlanStep>,
    },
    Map {
        over: Value,
        body: Vec<PlanStep>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: uuid::Uuid,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            steps,
        }
    }
}
