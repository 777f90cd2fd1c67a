use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use praxis_events::{Event, EventBus};
use praxis_tools::{Dispatcher, ToolCall};

use crate::error::{OrchestratorError, Result};
use crate::plan::{Plan, PlanStep, RetryAnnotation};

/// The orchestrator's fallback retry behavior for a step that carries no
/// `retry` annotation of its own. Per §4.8, the default at this layer is no
/// retry at all: `max_attempts: 1` means the first attempt is the only one.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl From<&RetryAnnotation> for RetryPolicy {
    fn from(annotation: &RetryAnnotation) -> Self {
        Self {
            max_attempts: annotation.max_attempts,
            base_delay: annotation.backoff,
        }
    }
}

/// Walks a parsed `Plan`, dispatching each `Call` step through a
/// `Dispatcher` (local or remote), evaluating `Branch` conditions, and
/// fanning `Map` steps out over their target collection. Progress and
/// terminal results are published on the event bus as each step resolves.
pub struct Orchestrator {
    dispatcher: Arc<Dispatcher>,
    events: EventBus,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(dispatcher: Arc<Dispatcher>, events: EventBus, retry: RetryPolicy) -> Self {
        Self { dispatcher, events, retry }
    }

    pub async fn run_plan(&self, plan: &Plan, cancellation: CancellationToken) -> Result<Vec<Value>> {
        let results = self
            .run_steps(&plan.steps, plan.id, &cancellation)
            .await?;
        self.events.publish(Event::DslResult {
            plan_id: plan.id,
            result: Value::Array(results.clone()),
        });
        Ok(results)
    }

    async fn run_steps(
        &self,
        steps: &[PlanStep],
        plan_id: uuid::Uuid,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(OrchestratorError::Canceled);
            }
            self.events.publish(Event::DslProgress {
                plan_id,
                step_index: index,
                step_count: steps.len(),
                detail: step_label(step),
            });
            results.push(self.run_step(step, plan_id, cancellation).await?);
        }
        Ok(results)
    }

    async fn run_step(&self, step: &PlanStep, plan_id: uuid::Uuid, cancellation: &CancellationToken) -> Result<Value> {
        match step {
            PlanStep::Call { tool, arguments, retry } => {
                let policy = retry.as_ref().map(RetryPolicy::from).unwrap_or_else(|| self.retry.clone());
                self.run_call(tool, arguments.clone(), &policy).await
            }
            PlanStep::Branch { condition, then_steps, else_steps } => {
                let branch = match condition {
                    Value::Bool(b) => *b,
                    other => return Err(OrchestratorError::InvalidCondition(other.to_string())),
                };
                let chosen = if branch { then_steps } else { else_steps };
                let results = Box::pin(self.run_steps(chosen, plan_id, cancellation)).await?;
                Ok(Value::Array(results))
            }
            PlanStep::Map { over, body } => {
                let items = over
                    .as_array()
                    .cloned()
                    .ok_or_else(|| OrchestratorError::InvalidMapTarget(over.to_string()))?;
                let mut mapped = Vec::with_capacity(items.len());
                for _item in items {
                    let results = Box::pin(self.run_steps(body, plan_id, cancellation)).await?;
                    mapped.push(Value::Array(results));
                }
                Ok(Value::Array(mapped))
            }
        }
    }

    async fn run_call(&self, tool: &str, arguments: Value, policy: &RetryPolicy) -> Result<Value> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let call = ToolCall { name: tool.to_string(), arguments: arguments.clone() };
            match self.dispatcher.dispatch(call).await {
                Ok(output) => return Ok(serde_json::to_value(output.parts).unwrap_or(Value::Null)),
                Err(e) if attempts < policy.max_attempts => {
                    let delay = jittered_backoff(policy.base_delay, attempts);
                    warn!(tool, attempts, delay_ms = delay.as_millis() as u64, error = %e, "tool call failed, retrying");
                    sleep(delay).await;
                }
                Err(e) => {
                    debug!(tool, attempts, "tool call exhausted retries");
                    return Err(OrchestratorError::StepFailed { attempts, source: e });
                }
            }
        }
    }
}

/// Exponential backoff (`base * 2^(attempt-1)`) with full jitter: the
/// sleep is drawn uniformly from `[0, computed_delay]` so many callers
/// retrying the same failure don't converge back on the same instant.
fn jittered_backoff(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let capped = base.saturating_mul(1u32.checked_shl(exponent).unwrap_or(u32::MAX));
    let jitter_fraction: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    capped.mul_f64(jitter_fraction)
}

fn step_label(step: &PlanStep) -> String {
    match step {
        PlanStep::Call { tool, .. } => format!("call:{tool}"),
        PlanStep::Branch { .. } => "branch".to_string(),
        PlanStep::Map { .. } => "map".to_string(),
    }
}
