use tracing::{info, warn};

use super::RemoteTransfer;
use crate::internal::transfer::structs::{TransferError, TransferStatus};

impl RemoteTransfer {
    /// 关闭句柄后比较目标大小与探测到的总大小。不一致（或无法读取）时文件保留在磁盘上。
    pub(super) async fn verify_size(&mut self) -> Result<bool, TransferError> {
        self.session.set_status(TransferStatus::Verifying);
        let expected = self.session.state().total_size;

        if let Err(e) = self.storage.finish().await {
            warn!(error = %e, "关闭目标文件失败");
        }

        let actual = match self.storage.stored_size(&self.config.destination).await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "读取目标文件大小失败");
                None
            }
        };

        if actual != Some(expected) {
            return Err(TransferError::SizeMismatch { expected, actual });
        }

        info!(size = expected, destination = %self.config.destination.display(), "下载完成");
        Ok(true)
    }
}
