//! HTTP 传输层接口：只负责把带 Range 头的请求发出去并交回响应。
//!
//! 默认实现见 [`ReqwestTransport`](crate::internal::transfer::impl_traits::reqwest_transport::ReqwestTransport)，
//! 测试中可替换为内存实现。

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::internal::transfer::structs::{ChunkRange, TransferConfig};

/// 响应体：按到达顺序产出的字节块。
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O 失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// 一次 Range 请求：请求模板的副本，`Range` 头已按分片覆盖。
#[derive(Debug, Clone)]
pub struct RangeRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub range: ChunkRange,
}

impl RangeRequest {
    pub fn from_template(config: &TransferConfig, range: ChunkRange) -> Self {
        let mut headers = config.headers.clone();
        // header_value 只含 ASCII 数字与 "bytes=-"
        if let Ok(value) = HeaderValue::from_str(&range.header_value()) {
            headers.insert(RANGE, value);
        }
        Self {
            url: config.url.clone(),
            method: config.method.clone(),
            headers,
            body: config.body.clone(),
            range,
        }
    }
}

pub struct RangeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// 没有响应体时为 `None`
    pub body: Option<BodyStream>,
}

impl std::fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

#[async_trait]
pub trait RangeTransport: Send + Sync {
    async fn send(&self, request: RangeRequest) -> Result<RangeResponse, TransportError>;
}
