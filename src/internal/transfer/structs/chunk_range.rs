//! 分片区间：按 chunk_size 把 `[0, total)` 切成连续、不重叠、递增的闭区间。

use std::fmt;

/// 单个分片的闭区间 `[start, end]`（字节偏移，均包含）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    /// 从 `offset` 开始的下一个分片；末片截断到 `total - 1`。
    ///
    /// 调用方保证 `chunk_size >= 1` 且 `offset < total`。
    pub fn starting_at(offset: u64, chunk_size: u64, total: u64) -> Self {
        let end = offset
            .saturating_add(chunk_size.saturating_sub(1))
            .min(total.saturating_sub(1));
        Self { start: offset, end }
    }

    /// 探测大小用的零长度区间 `bytes=0-0`。
    pub fn probe() -> Self {
        Self { start: 0, end: 0 }
    }

    /// 区间字节数。
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// 生成 Range 请求头：`bytes=start-end`。
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// 完整切分计划，共 `ceil(total / chunk_size)` 段；`chunk_size` 为 0 时为空。
    pub fn plan(total: u64, chunk_size: u64) -> impl Iterator<Item = ChunkRange> {
        let mut offset = 0u64;
        std::iter::from_fn(move || {
            if chunk_size == 0 || offset >= total {
                return None;
            }
            let range = ChunkRange::starting_at(offset, chunk_size, total);
            offset = range.end + 1;
            Some(range)
        })
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
