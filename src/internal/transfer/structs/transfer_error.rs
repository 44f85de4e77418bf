//! 传输相关错误类型。

use std::path::PathBuf;

use thiserror::Error;

use super::chunk_range::ChunkRange;
use crate::internal::transfer::traits::range_transport::TransportError;

/// 一次传输中的致命错误；任何一个都会立即终止整个 `download()`。
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("未设置保存路径")]
    DestinationPathMissing,

    #[error("配置无效: {0}")]
    InvalidConfig(String),

    #[error("打开目标文件失败 {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法获取远程文件大小: {reason}")]
    SizeUnknown { reason: String },

    #[error("分片 {range} 下载失败，已尝试 {attempts} 次: {reason}")]
    ChunkFetch {
        range: ChunkRange,
        attempts: u32,
        reason: String,
    },

    #[error("偏移 {offset} 处写入失败，已尝试 {attempts} 次: {source}")]
    ChunkWrite {
        offset: u64,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("读取响应流失败: {0}")]
    StreamRead(#[source] TransportError),

    #[error("文件大小不一致: 期望 {expected}，实际 {actual:?}")]
    SizeMismatch { expected: u64, actual: Option<u64> },
}

/// [`TransferError`] 的判别值，可复制，便于状态机和测试区分失败原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferErrorKind {
    DestinationPathMissing,
    InvalidConfig,
    OpenFile,
    SizeUnknown,
    ChunkFetch,
    ChunkWrite,
    StreamRead,
    SizeMismatch,
}

impl TransferError {
    pub fn kind(&self) -> TransferErrorKind {
        match self {
            TransferError::DestinationPathMissing => TransferErrorKind::DestinationPathMissing,
            TransferError::InvalidConfig(_) => TransferErrorKind::InvalidConfig,
            TransferError::OpenFile { .. } => TransferErrorKind::OpenFile,
            TransferError::SizeUnknown { .. } => TransferErrorKind::SizeUnknown,
            TransferError::ChunkFetch { .. } => TransferErrorKind::ChunkFetch,
            TransferError::ChunkWrite { .. } => TransferErrorKind::ChunkWrite,
            TransferError::StreamRead(_) => TransferErrorKind::StreamRead,
            TransferError::SizeMismatch { .. } => TransferErrorKind::SizeMismatch,
        }
    }

    pub(crate) fn size_unknown(reason: impl Into<String>) -> Self {
        TransferError::SizeUnknown {
            reason: reason.into(),
        }
    }
}
