use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::providers::{FileWriter, Filesystem};

/// Filesystem backed by the local disk through tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn create_file(&self, path: &Path) -> io::Result<FileWriter> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::new(file))
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = path.to_path_buf();
        tokio::task::spawn_blocking(move || FileManager::list_children(dir))
            .await
            .map_err(io::Error::other)?
    }

    async fn read_text(&self, path: &Path) -> io::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}
