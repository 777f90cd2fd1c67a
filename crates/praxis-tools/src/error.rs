use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool {0} is not registered")]
    NotFound(String),

    #[error("tool {0} is already registered")]
    AlreadyRegistered(String),

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("engine spawn failed: {0}")]
    EngineSpawn(String),

    #[error("remote mcp error: {0}")]
    RemoteMcp(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;
