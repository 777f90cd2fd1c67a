pub mod container;
pub mod remote_mcp;

pub use container::{ContainerEngine, ContainerEngineSpec};
pub use remote_mcp::{RemoteMcpEngine, RemoteMcpTransport};
