//! 进度/速度采样：两次回调之间至少间隔一秒（墙上时钟）。

use chrono::{DateTime, Utc};

use super::transfer_session::TransferSession;
use crate::internal::transfer::traits::progress_sink::ProgressSink;

/// 采样最小间隔（毫秒），距上次采样必须严格大于该值。
pub const SAMPLE_INTERVAL_MS: i64 = 1000;

/// 每次写入成功后调用。距上次采样超过 [`SAMPLE_INTERVAL_MS`] 时计算速度、更新采样点并回调，
/// 返回本次回调的 `(百分比, 字节/秒)`；未到间隔时返回 `None`。
pub fn sample(
    session: &mut TransferSession,
    now: DateTime<Utc>,
    sink: Option<&mut (dyn ProgressSink + '_)>,
) -> Option<(f64, f64)> {
    let elapsed_ms = (now - session.state().last_sample_time).num_milliseconds();
    if elapsed_ms <= SAMPLE_INTERVAL_MS {
        return None;
    }

    let speed = session.state().speed_at(now);
    session.mark_sampled(now);
    let progress = session.state().progress();

    if let Some(sink) = sink {
        sink.on_progress(progress, speed);
    }
    Some((progress, speed))
}
