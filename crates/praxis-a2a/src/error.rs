use thiserror::Error;

/// JSON-RPC 2.0 reserved and application error codes this dispatcher can
/// return.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const TASK_NOT_FOUND: i64 = -32001;
pub const TASK_NOT_CANCELABLE: i64 = -32002;

#[derive(Debug, Error)]
pub enum A2aError {
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error(transparent)]
    Task(#[from] praxis_task::TaskError),
}

impl A2aError {
    pub fn code(&self) -> i64 {
        match self {
            A2aError::Rpc { code, .. } => *code,
            A2aError::Task(praxis_task::TaskError::NotFound(_)) => TASK_NOT_FOUND,
            A2aError::Task(praxis_task::TaskError::AlreadyTerminal(_)) => TASK_NOT_CANCELABLE,
            A2aError::Task(_) => INTERNAL_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, A2aError>;
