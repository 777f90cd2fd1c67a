use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unit of content carried in a `Message` or `Artifact`: free text,
/// structured JSON data, or a reference to an external file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
    File { uri: String, media_type: String },
}

/// One turn in a task's conversation, from either the requester or the
/// executing agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub parts: Vec<Part>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

/// A durable output a task produces while working, distinct from the
/// conversational `Message`s exchanged along the way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: Uuid,
    pub name: String,
    pub parts: Vec<Part>,
    pub created_at: DateTime<Utc>,
}

/// The task lifecycle state machine. Transitions are monotonic: once a
/// task reaches a terminal state (`Completed`, `Failed`, `Canceled`) it
/// cannot move again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed { reason: String },
    Canceled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed { .. } | TaskStatus::Canceled
        )
    }

    /// Whether moving from `self` to `next` is a legal transition per the
    /// task lifecycle state machine.
    pub fn can_transition_to(&self, next: &TaskStatus) -> bool {
        use TaskStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Submitted, Working)
                | (Submitted, Canceled)
                | (Working, InputRequired)
                | (Working, Completed)
                | (Working, Failed { .. })
                | (Working, Canceled)
                | (InputRequired, Working)
                | (InputRequired, Canceled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub originator: String,
    pub status: TaskStatus,
    pub messages: Vec<Message>,
    pub artifacts: Vec<Artifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(originator: impl Into<String>, initial_message: Message) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            originator: originator.into(),
            status: TaskStatus::Submitted,
            messages: vec![initial_message],
            artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
