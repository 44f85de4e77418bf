use super::transfer_error::TransferErrorKind;

/// 传输状态（由会话内部维护，外部通过 monitor 只读监听）
///
/// `chunk` 为从 0 开始的分片序号，`attempt` 为已失败的尝试次数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferStatus {
    #[default]
    Idle,
    Probing,
    Downloading { chunk: u64 },
    RetryingFetch { chunk: u64, attempt: u32 },
    Writing { chunk: u64 },
    RetryingWrite { chunk: u64, attempt: u32 },
    Verifying,
    Completed,
    Failed(TransferErrorKind),
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed(_))
    }
}
