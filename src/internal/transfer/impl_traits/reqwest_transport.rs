//! 基于 reqwest 的默认传输实现。

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;

use crate::internal::transfer::traits::range_transport::{
    BodyStream, RangeRequest, RangeResponse, RangeTransport, TransportError,
};

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    pub client: Client, // 内部是Arc，clone 很便宜
}

impl ReqwestTransport {
    /// 使用默认 Client。不开启自动解压，否则 Range 偏移会对不上。
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// 复用调用方已配置好的 Client（代理、超时、证书等）。
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RangeTransport for ReqwestTransport {
    async fn send(&self, request: RangeRequest) -> Result<RangeResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();

        let body: Option<BodyStream> = if resp.content_length() == Some(0) {
            None
        } else {
            Some(Box::pin(resp.bytes_stream().map_err(TransportError::from)))
        };

        Ok(RangeResponse {
            status,
            headers,
            body,
        })
    }
}
