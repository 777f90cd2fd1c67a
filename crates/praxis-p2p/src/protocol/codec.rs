use std::io;
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use libp2p::request_response;
use libp2p::StreamProtocol;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::types::{
    A2aRequest, A2aResponse, CardExchangeRequest, CardExchangeResponse, ToolInvokeRequest,
    ToolInvokeResponse,
};

pub const CARD_EXCHANGE_PROTOCOL: StreamProtocol = StreamProtocol::new("/agent/card/1.0.0");
pub const TOOL_INVOKE_PROTOCOL: StreamProtocol = StreamProtocol::new("/agent/tool/invoke/1.0.0");
pub const A2A_PROTOCOL: StreamProtocol = StreamProtocol::new("/agent/a2a/1.0.0");

/// Upper bound on a single framed message, matching the host's memory
/// budget for a single in-flight request or response.
const MAX_MSG_BYTES: u32 = 8 * 1024 * 1024;

/// A length-prefixed JSON `request_response::Codec`, parameterized over
/// the request/response payload types so each of the three wire protocols
/// shares one framing implementation instead of three near-identical ones.
pub struct JsonCodec<Req, Resp> {
    _marker: PhantomData<(Req, Resp)>,
}

impl<Req, Resp> Default for JsonCodec<Req, Resp> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> Clone for JsonCodec<Req, Resp> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

async fn write_framed<T, V>(io: &mut T, value: &V) -> io::Result<()>
where
    T: AsyncWrite + Unpin + Send,
    V: Serialize,
{
    let bytes = serde_json::to_vec(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if bytes.len() as u64 > MAX_MSG_BYTES as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message of {} bytes exceeds the {MAX_MSG_BYTES}-byte limit", bytes.len()),
        ));
    }
    io.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    io.write_all(&bytes).await?;
    io.flush().await
}

async fn read_framed<T, V>(io: &mut T) -> io::Result<V>
where
    T: AsyncRead + Unpin + Send,
    V: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    io.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MSG_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("incoming message of {len} bytes exceeds the {MAX_MSG_BYTES}-byte limit"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    io.read_exact(&mut buf).await?;
    serde_json::from_slice(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[async_trait]
impl<Req, Resp> request_response::Codec for JsonCodec<Req, Resp>
where
    Req: Serialize + DeserializeOwned + Send + Sync + 'static,
    Resp: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Protocol = StreamProtocol;
    type Request = Req;
    type Response = Resp;

    async fn read_request<T>(&mut self, _protocol: &Self::Protocol, io: &mut T) -> io::Result<Req>
    where
        T: AsyncRead + Unpin + Send,
    {
        read_framed(io).await
    }

    async fn read_response<T>(&mut self, _protocol: &Self::Protocol, io: &mut T) -> io::Result<Resp>
    where
        T: AsyncRead + Unpin + Send,
    {
        read_framed(io).await
    }

    async fn write_request<T>(&mut self, _protocol: &Self::Protocol, io: &mut T, req: Req) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        write_framed(io, &req).await
    }

    async fn write_response<T>(&mut self, _protocol: &Self::Protocol, io: &mut T, resp: Resp) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        write_framed(io, &resp).await
    }
}

pub type CardCodec = JsonCodec<CardExchangeRequest, CardExchangeResponse>;
pub type ToolInvokeCodec = JsonCodec<ToolInvokeRequest, ToolInvokeResponse>;
pub type A2aCodec = JsonCodec<A2aRequest, A2aResponse>;

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_request_through_the_frame() {
        let request = ToolInvokeRequest {
            name: "echo".into(),
            arguments: serde_json::json!({"x": 1}),
        };
        let mut buf = Vec::new();
        write_framed(&mut buf, &request).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: ToolInvokeRequest = read_framed(&mut cursor).await.unwrap();
        assert_eq!(decoded.name, "echo");
        assert_eq!(decoded.arguments, serde_json::json!({"x": 1}));
    }

    #[tokio::test]
    async fn oversized_incoming_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_MSG_BYTES + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        let result: io::Result<ToolInvokeRequest> = read_framed(&mut cursor).await;
        assert!(result.is_err());
    }
}
