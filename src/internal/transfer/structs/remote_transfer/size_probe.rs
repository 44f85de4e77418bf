//! 探测远程资源总大小：`Range: bytes=0-0`，读取 `Content-Range` 中的 `/total`。

use reqwest::header::CONTENT_RANGE;
use tracing::{debug, info};

use super::RemoteTransfer;
use crate::internal::transfer::structs::{ChunkRange, TransferError, TransferStatus};
use crate::internal::transfer::traits::range_transport::RangeRequest;

impl RemoteTransfer {
    /// 只发一次请求，不重试；拿不到大于 0 的总大小即返回 `SizeUnknown`。
    pub(super) async fn probe_total_size(&mut self) -> Result<u64, TransferError> {
        self.session.set_status(TransferStatus::Probing);

        let request = RangeRequest::from_template(&self.config, ChunkRange::probe());
        let resp = self
            .transport
            .send(request)
            .await
            .map_err(|e| TransferError::size_unknown(format!("探测请求失败: {e}")))?;
        debug!(status = %resp.status, "探测响应");

        let header = resp
            .headers
            .get(CONTENT_RANGE)
            .ok_or_else(|| TransferError::size_unknown("响应缺少 Content-Range"))?;
        let text = header
            .to_str()
            .map_err(|_| TransferError::size_unknown("Content-Range 不是合法文本"))?;
        let total = parse_content_range_total(text)
            .ok_or_else(|| TransferError::size_unknown(format!("Content-Range 无法解析: {text}")))?;
        if total == 0 {
            return Err(TransferError::size_unknown("远程文件大小为 0"));
        }

        self.session.set_total_size(total);
        info!(total, "远程文件大小");
        Ok(total)
    }
}

/// 解析 `<unit> <first>-<last>/<total>` 中的 `<total>`。
///
/// 区间部分也接受 `*`（416 响应的写法）；总大小为 `*` 或格式不对时返回 `None`。
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = split_content_range(value)?;
    total.parse::<u64>().ok()
}

/// 解析 `<unit> <first>-<last>/<total>` 中的 `<first>`，分片响应用它确认数据起点。
///
/// 区间为 `*` 或格式不对时返回 `None`；总大小允许是 `*`。
pub(crate) fn parse_content_range_start(value: &str) -> Option<u64> {
    let (span, _) = split_content_range(value)?;
    span.map(|(first, _)| first)
}

/// 拆出区间（`*` 为 `None`）与未解析的总大小文本。
fn split_content_range(value: &str) -> Option<(Option<(u64, u64)>, &str)> {
    let (unit, rest) = value.trim().split_once(' ')?;
    if unit.is_empty() {
        return None;
    }
    let (span, total) = rest.trim().split_once('/')?;
    let span = span.trim();
    let span = if span == "*" {
        None
    } else {
        let (first, last) = span.split_once('-')?;
        let first = first.trim().parse::<u64>().ok()?;
        let last = last.trim().parse::<u64>().ok()?;
        if last < first {
            return None;
        }
        Some((first, last))
    };
    let total = total.trim();
    if total.is_empty() {
        return None;
    }
    Some((span, total))
}
