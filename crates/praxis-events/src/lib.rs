use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A task's lifecycle state, mirrored here rather than borrowed from
/// `praxis-task` so this crate stays a leaf dependency: the task manager
/// publishes through an `EventBus`, so the borrow would run the other way
/// and create a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatusKind {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed { reason: String },
    Canceled,
}

/// Every event kind the runtime publishes, spanning orchestrator progress,
/// workflow lifecycle, chat turns, and task lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    DslProgress {
        plan_id: Uuid,
        step_index: usize,
        step_count: usize,
        detail: String,
    },
    DslResult {
        plan_id: Uuid,
        result: Value,
    },
    WorkflowStarted {
        workflow_id: Uuid,
    },
    WorkflowNodeStatus {
        workflow_id: Uuid,
        node_id: String,
        status: String,
    },
    WorkflowLog {
        workflow_id: Uuid,
        message: String,
    },
    WorkflowCompleted {
        workflow_id: Uuid,
    },
    WorkflowFailed {
        workflow_id: Uuid,
        reason: String,
    },
    ChatMessage {
        task_id: Uuid,
        from: String,
        text: String,
    },
    TaskCreated {
        task_id: Uuid,
        originator: String,
    },
    TaskStatusChanged {
        task_id: Uuid,
        status: TaskStatusKind,
    },
    TaskArtifact {
        task_id: Uuid,
        artifact_id: Uuid,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub event: Event,
}

/// A bounded, lossy, multi-subscriber event bus. Slow subscribers drop the
/// oldest buffered events rather than back-pressuring publishers, matching
/// the runtime's "isolated consumers, no publisher stall" policy.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Publishes `event`, returning the number of live subscribers it
    /// reached. Publishing never blocks and never fails solely because
    /// there are no subscribers.
    pub fn publish(&self, event: Event) -> usize {
        let envelope = EventEnvelope {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        };
        self.sender.send(envelope).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_events_reach_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(Event::TaskCreated {
            task_id: Uuid::new_v4(),
            originator: "peer-a".into(),
        });
        let envelope = rx.recv().await.unwrap();
        assert!(matches!(envelope.event, Event::TaskCreated { .. }));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        let reached = bus.publish(Event::WorkflowStarted {
            workflow_id: Uuid::new_v4(),
        });
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_drops_oldest_not_publisher() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(Event::DslProgress {
                plan_id: Uuid::new_v4(),
                step_index: i,
                step_count: 5,
                detail: "tick".into(),
            });
        }
        let result = rx.recv().await;
        assert!(matches!(result, Err(broadcast::error::RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn independent_subscribers_each_get_their_own_stream() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(Event::ChatMessage {
            task_id: Uuid::new_v4(),
            from: "peer-a".into(),
            text: "hi".into(),
        });
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }
}
