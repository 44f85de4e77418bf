/// 内部实现的模块
mod internal;


/// 导出核心入口
pub use internal::transfer::structs::{
    ChunkRange, RemoteTransfer, TransferConfig, TransferError, TransferErrorKind,
    TransferOptions, TransferSnapshot, TransferStatus, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_TIMEOUT_MS,
};
pub use internal::states::transfer_monitor::TransferMonitor;
pub use internal::transfer::traits::progress_sink::ProgressSink;

/// 重试策略，拉取与写入各用一份
pub mod retry {
    use crate::internal;
    pub use internal::transfer::structs::retry_policy::*;
}

/// 外部协作者：HTTP 传输与目标存储，可替换为自定义实现
pub mod transport {
    use crate::internal;
    pub use internal::transfer::impl_traits::reqwest_transport::ReqwestTransport;
    pub use internal::transfer::traits::range_transport::*;
}

/// 目标存储：默认写本地文件，单次追加整体成功或整体失败
pub mod storage {
    use crate::internal;
    pub use internal::transfer::impl_traits::local_file_storage::LocalFileStorage;
    pub use internal::transfer::traits::destination_storage::*;
}
