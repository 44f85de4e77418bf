//! 基于 tokio::fs 的本地文件存储。

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::internal::transfer::traits::destination_storage::DestinationStorage;

#[derive(Debug, Default)]
pub struct LocalFileStorage {
    file: Option<File>,
    /// 已确认写入的字节数，失败的 append 写出的残留部分会被截回这里
    len: u64,
}

impl LocalFileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DestinationStorage for LocalFileStorage {
    async fn prepare(&mut self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "删除旧文件失败，忽略");
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        self.file = Some(file);
        self.len = 0;
        Ok(())
    }

    /// 整体成功或整体失败：写入前先截掉上次失败留下的残留，失败后再截回写入前的长度。
    async fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "目标文件尚未打开"))?;

        if file.metadata().await?.len() > self.len {
            file.set_len(self.len).await?;
        }

        let written = async {
            file.write_all(buf).await?;
            // tokio 的 File 在后台线程写入，flush 等待这次写入真正完成
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            if let Err(rollback) = file.set_len(self.len).await {
                warn!(error = %rollback, len = self.len, "截回写入前长度失败");
            }
            return Err(e);
        }
        self.len += buf.len() as u64;
        Ok(())
    }

    async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }

    async fn stored_size(&self, path: &Path) -> io::Result<Option<u64>> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
