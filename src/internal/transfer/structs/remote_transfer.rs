//! 分片顺序下载器
//!
//! 通过 HTTP Range 请求把单个远程资源按固定大小的分片依次拉取，顺序追加写入本地文件。
//!
//! ## 流程
//!
//! 1. **准备目标**：创建上级目录，删除旧文件，以追加方式打开
//! 2. **探测大小**：发送 `Range: bytes=0-0`，从 `Content-Range` 的 `/total` 读出总大小
//! 3. **分片循环**：从 `downloaded_size` 开始切出不超过 `chunk_size` 的区间，失败按
//!    `max_retries` / `retry_timeout` 重试
//! 4. **流式写入**：逐块写入目标，写入失败独立重试；成功后推进计数并触发采样
//! 5. **校验**：比较目标文件大小与探测到的总大小
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use chunked_fetch::{RemoteTransfer, TransferConfig};
//! # async fn example() -> Result<(), chunked_fetch::TransferError> {
//! let config = TransferConfig::new("https://example.com/large.iso", "downloads/large.iso")?
//!     .chunk_size(4 * 1024 * 1024)
//!     .max_retries(10);
//!
//! let mut transfer = RemoteTransfer::new(config)?;
//! transfer
//!     .download_with_progress(|pct: f64, speed: f64| {
//!         println!("{pct:.1}% {:.2} MB/s", speed / 1024.0 / 1024.0);
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## 内部实现说明
//!
//! - `size_probe`：探测请求与 `Content-Range` 解析
//! - `chunk_loop`：分片切分与拉取重试
//! - `stream_copier`：响应体逐块写入与写入重试
//! - `finalizer`：最终大小校验
//!
//! 探测请求本身不重试：一次失败即 `SizeUnknown`，与分片拉取的重试策略不同。

mod chunk_loop;
mod finalizer;
mod size_probe;
mod stream_copier;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::transfer_config::TransferConfig;
use super::transfer_error::TransferError;
use super::transfer_session::TransferSession;
use super::transfer_status::TransferStatus;
use crate::internal::states::transfer_monitor::TransferMonitor;
use crate::internal::transfer::impl_traits::local_file_storage::LocalFileStorage;
use crate::internal::transfer::impl_traits::reqwest_transport::ReqwestTransport;
use crate::internal::transfer::traits::destination_storage::DestinationStorage;
use crate::internal::transfer::traits::progress_sink::ProgressSink;
use crate::internal::transfer::traits::range_transport::RangeTransport;

#[cfg(test)]
pub(crate) use size_probe::{parse_content_range_start, parse_content_range_total};

/// 远程资源分片下载器，不实现 Clone：同一目标同时只能有一个写入者。
///
/// `download*` 需要 `&mut self`，同一实例可以先后多次下载，但不能并发。
pub struct RemoteTransfer {
    config: TransferConfig,
    session: TransferSession,
    transport: Arc<dyn RangeTransport>,
    storage: Box<dyn DestinationStorage>,
}

impl std::fmt::Debug for RemoteTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTransfer")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl RemoteTransfer {
    /// 使用默认的 reqwest 传输与本地文件存储。
    pub fn new(config: TransferConfig) -> Result<Self, TransferError> {
        let transport =
            ReqwestTransport::new().map_err(|e| TransferError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            config,
            session: TransferSession::new(Utc::now()),
            transport: Arc::new(transport),
            storage: Box::new(LocalFileStorage::new()),
        })
    }

    /// 替换 HTTP 传输实现。
    pub fn with_transport(mut self, transport: impl RangeTransport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// 替换目标存储实现。
    pub fn with_storage(mut self, storage: impl DestinationStorage + 'static) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// 只读观察句柄，可在下载进行中从其他任务读取进度。
    pub fn monitor(&self) -> TransferMonitor {
        self.session.monitor()
    }

    pub fn status(&self) -> TransferStatus {
        self.session.state().status
    }

    pub fn total_size(&self) -> u64 {
        self.session.state().total_size
    }

    pub fn downloaded_size(&self) -> u64 {
        self.session.state().downloaded_size
    }

    /// 进度百分比（0～100）；总大小未知时为 0。
    pub fn get_progress(&self) -> f64 {
        self.session.state().progress()
    }

    /// 以当前时间计算自上次采样以来的速度（字节/秒），不受采样节流影响。
    pub fn get_download_speed(&self) -> f64 {
        self.session.state().speed_at(Utc::now())
    }

    /// 执行下载，不接收进度回调。成功返回 `Ok(true)`。
    pub async fn download(&mut self) -> Result<bool, TransferError> {
        self.run(None).await
    }

    /// 执行下载，采样器每隔一秒以上以 `(百分比, 字节/秒)` 调用一次 `sink`。
    pub async fn download_with_progress(
        &mut self,
        mut sink: impl ProgressSink,
    ) -> Result<bool, TransferError> {
        self.run(Some(&mut sink)).await
    }

    async fn run(
        &mut self,
        sink: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<bool, TransferError> {
        self.session.reset(Utc::now());
        info!(
            url = %self.config.url,
            destination = %self.config.destination.display(),
            chunk_size = self.config.options.chunk_size,
            "开始下载"
        );

        let result = self.execute(sink).await;
        match &result {
            Ok(_) => self.session.set_status(TransferStatus::Completed),
            Err(e) => {
                warn!(error = %e, downloaded = self.downloaded_size(), "下载失败");
                // 失败的本次下载留下的文件不清理，只释放句柄
                if let Err(close_err) = self.storage.finish().await {
                    warn!(error = %close_err, "关闭目标文件失败");
                }
                self.session.set_status(TransferStatus::Failed(e.kind()));
            }
        }
        result
    }

    async fn execute(
        &mut self,
        mut sink: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<bool, TransferError> {
        if self.config.destination.as_os_str().is_empty() {
            return Err(TransferError::DestinationPathMissing);
        }
        self.config.options.validate()?;

        self.prepare_destination().await?;
        self.probe_total_size().await?;
        self.fetch_all_chunks(sink.as_deref_mut()).await?;
        self.verify_size().await
    }

    async fn prepare_destination(&mut self) -> Result<(), TransferError> {
        let path = &self.config.destination;
        self.storage
            .prepare(path)
            .await
            .map_err(|source| TransferError::OpenFile {
                path: path.clone(),
                source,
            })
    }
}
