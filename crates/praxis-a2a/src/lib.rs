pub mod error;
pub mod http;
pub mod rpc;

pub use error::{A2aError, Result};
pub use http::router;
pub use rpc::{A2aDispatcher, JsonRpcErrorBody, JsonRpcRequest, JsonRpcResponse};
