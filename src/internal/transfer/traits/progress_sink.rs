//! 进度回调：采样器每隔一秒以上调用一次，参数为百分比与速度（字节/秒）。
//!
//! 回调在写入路径上同步执行，耗时会直接拖慢传输。

/// 进度接收端。闭包 `FnMut(f64, f64)` 自动实现本 trait。
pub trait ProgressSink: Send {
    fn on_progress(&mut self, percentage: f64, bytes_per_second: f64);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64, f64) + Send,
{
    fn on_progress(&mut self, percentage: f64, bytes_per_second: f64) {
        self(percentage, bytes_per_second)
    }
}
