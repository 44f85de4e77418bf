//! 目标存储接口：顺序追加写入，单次 `append` 要么整体成功要么整体失败。

use std::io;
use std::path::Path;

use async_trait::async_trait;

#[async_trait]
pub trait DestinationStorage: Send + Sync {
    /// 创建上级目录、删除已有文件（失败忽略）、以追加方式打开目标。
    async fn prepare(&mut self, path: &Path) -> io::Result<()>;

    /// 追加一段字节，返回时已落盘（至少已交给操作系统）。
    async fn append(&mut self, buf: &[u8]) -> io::Result<()>;

    /// 刷新并关闭目标句柄。
    async fn finish(&mut self) -> io::Result<()>;

    /// 目标当前大小；文件不存在时返回 `Ok(None)`。
    async fn stored_size(&self, path: &Path) -> io::Result<Option<u64>>;
}
