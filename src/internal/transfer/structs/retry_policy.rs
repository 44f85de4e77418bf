//! 固定间隔重试策略：最多尝试 `max_retries` 次，两次尝试之间等待 `retry_timeout`。
//!
//! 拉取分片与写入文件各自 [`RetryPolicy::begin`] 一份独立的 [`RetryState`]，预算互不共享。

use std::time::Duration;

/// 重试策略（不可变，可复制）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_timeout: Duration,
}

/// 重试次数耗尽，携带最后一次失败原因。
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// 单个操作的重试计数。
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_timeout: Duration) -> Self {
        Self {
            max_retries,
            retry_timeout,
        }
    }

    /// 为一次新的操作开始计数。
    pub fn begin(&self) -> RetryState {
        RetryState {
            policy: *self,
            failures: 0,
        }
    }
}

impl RetryState {
    /// 已失败的尝试次数。
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// 记录一次失败。
    ///
    /// 预算未用完时等待 `retry_timeout` 后返回 `Ok`，调用方再尝试一次；
    /// 已达 `max_retries` 时立即返回 `Err`，最后一次失败之后不再等待。
    pub async fn record_failure<E>(&mut self, error: E) -> Result<(), RetryExhausted<E>> {
        self.failures += 1;
        if self.failures >= self.policy.max_retries {
            return Err(RetryExhausted {
                attempts: self.failures,
                last_error: error,
            });
        }
        if !self.policy.retry_timeout.is_zero() {
            tokio::time::sleep(self.policy.retry_timeout).await;
        }
        Ok(())
    }
}
