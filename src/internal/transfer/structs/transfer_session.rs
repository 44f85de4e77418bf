use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::transfer_snapshot::TransferSnapshot;
use super::transfer_status::TransferStatus;
use crate::internal::states::transfer_monitor::TransferMonitor;

/// 单次下载的可变状态，由 [`RemoteTransfer`](super::RemoteTransfer) 独占持有。
///
/// 每次修改后都会通过 watch 通道发布快照，[`TransferMonitor`] 只读不写。
#[derive(Debug)]
pub struct TransferSession {
    state: TransferSnapshot,
    publisher: watch::Sender<TransferSnapshot>,
}

impl TransferSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        let state = TransferSnapshot::new(now);
        let (publisher, _) = watch::channel(state);
        Self { state, publisher }
    }

    pub fn state(&self) -> &TransferSnapshot {
        &self.state
    }

    pub fn monitor(&self) -> TransferMonitor {
        TransferMonitor::new(self.publisher.subscribe())
    }

    /// 每次 `download()` 开始时清零计数器。
    pub(crate) fn reset(&mut self, now: DateTime<Utc>) {
        self.state = TransferSnapshot::new(now);
        self.publish();
    }

    pub(crate) fn set_status(&mut self, status: TransferStatus) {
        self.state.status = status;
        self.publish();
    }

    pub(crate) fn set_total_size(&mut self, total_size: u64) {
        self.state.total_size = total_size;
        self.publish();
    }

    /// 一次写入确认成功后推进已下载字节数；这是唯一修改 `downloaded_size` 的地方。
    pub(crate) fn record_written(&mut self, len: u64) {
        debug_assert!(self.state.downloaded_size + len <= self.state.total_size);
        self.state.downloaded_size += len;
        self.publish();
    }

    pub(crate) fn mark_sampled(&mut self, now: DateTime<Utc>) {
        self.state.last_sample_time = now;
        self.state.last_sampled_size = self.state.downloaded_size;
        self.publish();
    }

    fn publish(&self) {
        // 没有订阅者时也要保存最新值，供之后创建的 monitor 读取
        self.publisher.send_replace(self.state);
    }
}
