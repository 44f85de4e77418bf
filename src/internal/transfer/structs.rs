pub mod chunk_range;
pub mod progress_sampler;
pub mod remote_transfer;
pub mod retry_policy;
pub mod transfer_config;
pub mod transfer_error;
pub mod transfer_session;
pub mod transfer_snapshot;
pub mod transfer_status;

// 重导出公共类型
pub use chunk_range::ChunkRange;
pub use remote_transfer::RemoteTransfer;
pub use retry_policy::{RetryExhausted, RetryPolicy, RetryState};
pub use transfer_config::{
    TransferConfig, TransferOptions, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_TIMEOUT_MS,
};
pub use transfer_error::{TransferError, TransferErrorKind};
pub use transfer_session::TransferSession;
pub use transfer_snapshot::TransferSnapshot;
pub use transfer_status::TransferStatus;
