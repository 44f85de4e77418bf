use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};
use url::Url;

use super::retry_policy::RetryPolicy;
use super::transfer_error::TransferError;

/// 默认分片大小：10MB
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// 默认重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 120;

/// 默认重试间隔（毫秒）
pub const DEFAULT_RETRY_TIMEOUT_MS: u64 = 5000;

/// 分片与重试参数。可由宿主进程从自己的配置文件反序列化得到，缺省字段取默认值。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    /// 每个分片的大小（字节），至少为 1
    pub chunk_size: u64,
    /// 两次重试之间的等待时间；配置里以毫秒表示
    #[serde(rename = "retry_timeout_ms", deserialize_with = "duration_from_millis")]
    pub retry_timeout: Duration,
    /// 单个分片拉取、单次写入各自的最大尝试次数
    pub max_retries: u32,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_timeout: Duration::from_millis(DEFAULT_RETRY_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl TransferOptions {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_timeout)
    }

    pub(crate) fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidConfig("chunk_size 必须至少为 1".into()));
        }
        if self.max_retries == 0 {
            return Err(TransferError::InvalidConfig("max_retries 必须至少为 1".into()));
        }
        Ok(())
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// 一次下载的请求模板与参数。探测请求和每个分片请求都复用这里的
/// method / headers / body，只覆盖 `Range` 头。
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub url: Url,
    pub destination: PathBuf,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub options: TransferOptions,
}

impl TransferConfig {
    /// 目标路径允许为空，空路径会在 `download()` 时报 `DestinationPathMissing`。
    pub fn new(url: &str, destination: impl AsRef<Path>) -> Result<Self, TransferError> {
        let url = Url::parse(url)
            .map_err(|e| TransferError::InvalidConfig(format!("url 无效 {url}: {e}")))?;

        Ok(Self {
            url,
            destination: destination.as_ref().to_path_buf(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            options: TransferOptions::default(),
        })
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// 以字符串形式添加请求头，名称或值非法时返回 `InvalidConfig`。
    pub fn try_header(self, name: &str, value: &str) -> Result<Self, TransferError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransferError::InvalidConfig(format!("请求头名称无效 {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransferError::InvalidConfig(format!("请求头值无效: {e}")))?;
        Ok(self.header(name, value))
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 写入 `Authorization: Basic ...` 请求头。
    pub fn basic_auth(self, username: &str, password: &str) -> Result<Self, TransferError> {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        let value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| TransferError::InvalidConfig(e.to_string()))?;
        Ok(self.header(AUTHORIZATION, value))
    }

    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    pub fn retry_timeout(mut self, retry_timeout: Duration) -> Self {
        self.options.retry_timeout = retry_timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    pub fn options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }
}
