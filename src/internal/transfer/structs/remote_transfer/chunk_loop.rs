//! 分片循环：从 `downloaded_size` 开始依次拉取分片，每个分片有独立的拉取重试预算。

use reqwest::StatusCode;
use reqwest::header::CONTENT_RANGE;
use tracing::{debug, warn};

use super::RemoteTransfer;
use super::size_probe::parse_content_range_start;
use crate::internal::transfer::structs::{ChunkRange, TransferError, TransferStatus};
use crate::internal::transfer::traits::progress_sink::ProgressSink;
use crate::internal::transfer::traits::range_transport::{BodyStream, RangeRequest};

impl RemoteTransfer {
    /// 直到 `downloaded_size == total_size`。下一个分片的起点始终取自已确认写入的字节数。
    pub(super) async fn fetch_all_chunks(
        &mut self,
        mut sink: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<(), TransferError> {
        let chunk_size = self.config.options.chunk_size;
        let mut chunk = 0u64;

        loop {
            let state = *self.session.state();
            if state.downloaded_size >= state.total_size {
                return Ok(());
            }
            let range = ChunkRange::starting_at(state.downloaded_size, chunk_size, state.total_size);
            self.fetch_chunk(chunk, range, sink.as_deref_mut()).await?;
            chunk += 1;
        }
    }

    /// 拉取一个分片并交给写入器。请求出错、非 2xx、数据起点不对、没有响应体或响应体为空都算一次失败。
    async fn fetch_chunk(
        &mut self,
        chunk: u64,
        range: ChunkRange,
        mut sink: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<(), TransferError> {
        let mut retry = self.config.options.retry_policy().begin();

        loop {
            self.session.set_status(TransferStatus::Downloading { chunk });
            debug!(chunk, %range, "请求分片");

            let reason = match self.request_chunk(range).await {
                Ok(body) => {
                    let written = self.copy_body(chunk, range, body, sink.as_deref_mut()).await?;
                    if written > 0 {
                        return Ok(());
                    }
                    "响应体为空".to_string()
                }
                Err(reason) => reason,
            };

            let attempt = retry.failures() + 1;
            warn!(chunk, %range, attempt, %reason, "分片拉取失败");
            self.session
                .set_status(TransferStatus::RetryingFetch { chunk, attempt });
            retry
                .record_failure(reason)
                .await
                .map_err(|exhausted| TransferError::ChunkFetch {
                    range,
                    attempts: exhausted.attempts,
                    reason: exhausted.last_error,
                })?;
        }
    }

    /// 响应必须从 `range.start` 开始：206 以 `Content-Range` 的起点为准；
    /// 其他 2xx 视为服务器忽略了 Range、返回完整内容，只有起点为 0 的分片能用。
    async fn request_chunk(&self, range: ChunkRange) -> Result<BodyStream, String> {
        let request = RangeRequest::from_template(&self.config, range);
        let resp = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status.is_success() {
            return Err(format!("响应状态 {}", resp.status));
        }
        if resp.status == StatusCode::PARTIAL_CONTENT {
            let start = resp
                .headers
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_start);
            if start != Some(range.start) {
                return Err(format!(
                    "Content-Range 起点不符: 期望 {}，实际 {start:?}",
                    range.start
                ));
            }
        } else if range.start > 0 {
            return Err(format!("响应状态 {}，服务器忽略了 Range", resp.status));
        }
        resp.body.ok_or_else(|| "响应没有响应体".to_string())
    }
}
