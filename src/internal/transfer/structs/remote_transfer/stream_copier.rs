//! 流式写入：逐块读取响应体并追加到目标，写入失败按独立的预算重试。
//!
//! 读取响应体本身出错不重试，直接以 `StreamRead` 终止整个传输。

use chrono::Utc;
use futures_util::StreamExt;
use tracing::warn;

use super::RemoteTransfer;
use crate::internal::transfer::structs::progress_sampler::sample;
use crate::internal::transfer::structs::{ChunkRange, TransferError, TransferStatus};
use crate::internal::transfer::traits::progress_sink::ProgressSink;
use crate::internal::transfer::traits::range_transport::BodyStream;

impl RemoteTransfer {
    /// 返回本分片实际写入的字节数。
    ///
    /// 起点已由 `request_chunk` 确认，超出请求区间的尾部（从 0 开始的完整内容）直接截掉。
    pub(super) async fn copy_body(
        &mut self,
        chunk: u64,
        range: ChunkRange,
        mut body: BodyStream,
        mut sink: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<u64, TransferError> {
        self.session.set_status(TransferStatus::Writing { chunk });

        let expected = range.len();
        let mut written = 0u64;

        while let Some(item) = body.next().await {
            let mut buf = item.map_err(TransferError::StreamRead)?;
            if buf.is_empty() {
                continue;
            }

            let remaining = expected - written;
            let overflow = buf.len() as u64 > remaining;
            if overflow {
                warn!(chunk, %range, "响应数据超出请求区间，多余部分丢弃");
                buf.truncate(remaining as usize);
            }

            self.write_buffer(chunk, &buf).await?;
            let len = buf.len() as u64;
            written += len;
            self.session.record_written(len);
            sample(&mut self.session, Utc::now(), sink.as_deref_mut());

            if overflow || written == expected {
                break;
            }
        }

        Ok(written)
    }

    async fn write_buffer(&mut self, chunk: u64, buf: &[u8]) -> Result<(), TransferError> {
        let offset = self.session.state().downloaded_size;
        let mut retry = self.config.options.retry_policy().begin();

        loop {
            match self.storage.append(buf).await {
                Ok(()) => {
                    if retry.failures() > 0 {
                        self.session.set_status(TransferStatus::Writing { chunk });
                    }
                    return Ok(());
                }
                Err(e) => {
                    let attempt = retry.failures() + 1;
                    warn!(chunk, offset, attempt, error = %e, "写入失败");
                    self.session
                        .set_status(TransferStatus::RetryingWrite { chunk, attempt });
                    retry
                        .record_failure(e)
                        .await
                        .map_err(|exhausted| TransferError::ChunkWrite {
                            offset,
                            attempts: exhausted.attempts,
                            source: exhausted.last_error,
                        })?;
                }
            }
        }
    }
}
