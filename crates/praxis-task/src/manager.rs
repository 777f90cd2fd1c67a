use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use praxis_events::{Event, EventBus, TaskStatusKind};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TaskError};
use crate::types::{Artifact, Message, Task, TaskStatus};

struct TaskEntry {
    task: Mutex<Task>,
    cancellation: CancellationToken,
}

/// Owns every task's state and is the sole writer of task transitions,
/// matching the single-component/serialized-mutation policy for shared
/// task state. Reads take a per-task lock; writers never block readers of
/// other tasks. Every `create_task`/`update_status`/`add_artifact` call
/// emits exactly one lifecycle event on the shared event bus.
pub struct TaskManager {
    tasks: RwLock<HashMap<Uuid, Arc<TaskEntry>>>,
    events: EventBus,
}

impl TaskManager {
    pub fn new(events: EventBus) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub async fn create_task(&self, originator: impl Into<String>, first_message: Message) -> Task {
        let originator = originator.into();
        let task = Task::new(originator.clone(), first_message);
        let id = task.id;
        let entry = Arc::new(TaskEntry {
            task: Mutex::new(task.clone()),
            cancellation: CancellationToken::new(),
        });
        self.tasks.write().await.insert(id, entry);
        info!(task_id = %id, "task created");
        self.events.publish(Event::TaskCreated { task_id: id, originator });
        task
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<TaskEntry>> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))
    }

    pub async fn get_task(&self, id: Uuid) -> Result<Task> {
        let entry = self.entry(id).await?;
        let task = entry.task.lock().await.clone();
        Ok(task)
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        let mut out = Vec::new();
        for entry in self.tasks.read().await.values() {
            out.push(entry.task.lock().await.clone());
        }
        out
    }

    /// Applies a status transition, enforcing the lifecycle state machine.
    pub async fn update_status(&self, id: Uuid, next: TaskStatus) -> Result<Task> {
        let entry = self.entry(id).await?;
        let mut task = entry.task.lock().await;
        if task.status.is_terminal() {
            return Err(TaskError::AlreadyTerminal(id));
        }
        if !task.status.can_transition_to(&next) {
            return Err(TaskError::InvalidTransition {
                task: id,
                from: task.status.clone(),
                to: next,
            });
        }
        debug!(task_id = %id, from = ?task.status, to = ?next, "task transition");
        task.status = next;
        task.updated_at = Utc::now();
        self.events.publish(Event::TaskStatusChanged { task_id: id, status: status_kind(&task.status) });
        Ok(task.clone())
    }

    pub async fn add_message(&self, id: Uuid, message: Message) -> Result<Task> {
        let entry = self.entry(id).await?;
        let mut task = entry.task.lock().await;
        task.messages.push(message);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    pub async fn add_artifact(&self, id: Uuid, artifact: Artifact) -> Result<Task> {
        let entry = self.entry(id).await?;
        let mut task = entry.task.lock().await;
        let artifact_id = artifact.id;
        task.artifacts.push(artifact);
        task.updated_at = Utc::now();
        self.events.publish(Event::TaskArtifact { task_id: id, artifact_id });
        Ok(task.clone())
    }

    /// Requests cooperative cancellation of the task's execution and marks
    /// it `Canceled`. Execution loops observing the returned token should
    /// stop at their next cancellation point.
    pub async fn cancel_task(&self, id: Uuid) -> Result<Task> {
        let entry = self.entry(id).await?;
        entry.cancellation.cancel();
        self.update_status(id, TaskStatus::Canceled).await?;
        self.get_task(id).await
    }

    pub async fn cancellation_token(&self, id: Uuid) -> Result<CancellationToken> {
        Ok(self.entry(id).await?.cancellation.clone())
    }
}

/// Mirrors a `TaskStatus` into the events crate's decoupled status type. A
/// plain function rather than a `From` impl since neither type is local to
/// whichever crate would own the impl.
fn status_kind(status: &TaskStatus) -> TaskStatusKind {
    match status {
        TaskStatus::Submitted => TaskStatusKind::Submitted,
        TaskStatus::Working => TaskStatusKind::Working,
        TaskStatus::InputRequired => TaskStatusKind::InputRequired,
        TaskStatus::Completed => TaskStatusKind::Completed,
        TaskStatus::Failed { reason } => TaskStatusKind::Failed { reason: reason.clone() },
        TaskStatus::Canceled => TaskStatusKind::Canceled,
    }
}
