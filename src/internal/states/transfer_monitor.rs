//! # TransferMonitor
//!
//! 传输会话的只读观察句柄，基于 [`tokio::sync::watch`] 实现。
//!
//! 下载进行中 `download()` 独占会话的 `&mut`，其他任务无法直接查询进度；
//! 先通过 `RemoteTransfer::monitor()` 取得句柄，再 clone 到别的任务里读取或监听。
//!
//! ## 使用示例
//! ```rust,no_run
//! # async fn example(mut transfer: chunked_fetch::RemoteTransfer) {
//! let mut monitor = transfer.monitor();
//! tokio::spawn(async move {
//!     while let Some(s) = monitor.changed().await {
//!         println!("{:.1}%", s.progress());
//!     }
//! });
//! let _ = transfer.download().await;
//! # }
//! ```

use chrono::Utc;
use tokio::sync::watch;

use crate::internal::transfer::structs::{TransferSnapshot, TransferStatus};

/// 只读观察句柄，可随意 clone。
#[derive(Debug, Clone)]
pub struct TransferMonitor {
    receiver: watch::Receiver<TransferSnapshot>,
}

impl TransferMonitor {
    pub(crate) fn new(receiver: watch::Receiver<TransferSnapshot>) -> Self {
        Self { receiver }
    }

    /// 当前快照。
    pub fn snapshot(&self) -> TransferSnapshot {
        *self.receiver.borrow()
    }

    pub fn status(&self) -> TransferStatus {
        self.receiver.borrow().status
    }

    /// 进度百分比（0～100）。
    pub fn progress(&self) -> f64 {
        self.receiver.borrow().progress()
    }

    /// 以当前时间计算的下载速度（字节/秒）。
    pub fn download_speed(&self) -> f64 {
        self.receiver.borrow().speed_at(Utc::now())
    }

    /// 等待下一次变化并返回新快照；会话已销毁时返回 `None`。
    pub async fn changed(&mut self) -> Option<TransferSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// 等待会话进入 `Completed` 或 `Failed`；会话在此之前销毁时返回 `None`。
    pub async fn finished(&mut self) -> Option<TransferSnapshot> {
        let snapshot = self
            .receiver
            .wait_for(|s| s.status.is_terminal())
            .await
            .ok()?;
        Some(*snapshot)
    }
}
