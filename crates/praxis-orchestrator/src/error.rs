use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("plan execution canceled")]
    Canceled,

    #[error("step failed after {attempts} attempts: {source}")]
    StepFailed {
        attempts: u32,
        #[source]
        source: praxis_tools::ToolError,
    },

    #[error("branch condition must be a boolean, got: {0}")]
    InvalidCondition(String),

    #[error("map target must be a JSON array, got: {0}")]
    InvalidMapTarget(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
