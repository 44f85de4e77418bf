use chrono::{DateTime, Utc};

use super::transfer_status::TransferStatus;

/// 会话计数器的一份快照；会话每次变化都会发布一份新的快照。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSnapshot {
    pub status: TransferStatus,
    /// 探测得到的总大小，0 表示尚未知
    pub total_size: u64,
    /// 已确认写入目标文件的字节数
    pub downloaded_size: u64,
    /// 上次采样时间（墙上时钟）
    pub last_sample_time: DateTime<Utc>,
    /// 上次采样时的 `downloaded_size`
    pub last_sampled_size: u64,
}

impl TransferSnapshot {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: TransferStatus::Idle,
            total_size: 0,
            downloaded_size: 0,
            last_sample_time: now,
            last_sampled_size: 0,
        }
    }

    /// 进度百分比（0～100）；总大小未知（0）时返回 0。
    pub fn progress(&self) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        self.downloaded_size as f64 / self.total_size as f64 * 100.0
    }

    /// 以 `now` 计算自上次采样以来的速度（字节/秒）；经过时间不大于 0 时返回 0。
    pub fn speed_at(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.last_sample_time).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0.0;
        }
        let delta = self.downloaded_size.saturating_sub(self.last_sampled_size);
        delta as f64 / (elapsed_ms as f64 / 1000.0)
    }
}
