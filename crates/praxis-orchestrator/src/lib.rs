pub mod error;
pub mod plan;
pub mod remote;
pub mod walker;

pub use error::{OrchestratorError, Result};
pub use plan::{Plan, PlanStep};
pub use remote::P2pToolExecutor;
pub use walker::{Orchestrator, RetryPolicy};
