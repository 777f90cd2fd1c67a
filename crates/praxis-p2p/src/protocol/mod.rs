pub mod codec;
pub mod types;

pub use codec::{
    A2aCodec, CardCodec, JsonCodec, ToolInvokeCodec, A2A_PROTOCOL, CARD_EXCHANGE_PROTOCOL,
    TOOL_INVOKE_PROTOCOL,
};
pub use types::{
    A2aRequest, A2aResponse, CardExchangeRequest, CardExchangeResponse, ToolInvokeRequest,
    ToolInvokeResponse,
};
