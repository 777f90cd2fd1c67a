pub mod behaviour;
pub mod config;
pub mod error;
pub mod log_layer;
pub mod node;
pub mod protocol;
pub mod transport;

pub use behaviour::{new_behaviour, PraxisBehaviour, PraxisBehaviourEvent};
pub use config::P2pConfig;
pub use error::{P2pError, Result};
pub use log_layer::{LogCaptureLayer, LogEntry};
pub use node::{CachedCard, P2pCommand, P2pEvent, P2pHandle, P2pNode};
