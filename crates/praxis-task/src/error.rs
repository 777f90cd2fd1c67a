use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(Uuid),

    #[error("task {task} cannot transition from {from:?} to {to:?}")]
    InvalidTransition {
        task: Uuid,
        from: crate::types::TaskStatus,
        to: crate::types::TaskStatus,
    },

    #[error("task {0} is already in a terminal state")]
    AlreadyTerminal(Uuid),
}

pub type Result<T> = std::result::Result<T, TaskError>;
