/*!
 * Concurrent read-back of extracted subtitle files.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::RetrievalError;
use crate::providers::Filesystem;

use super::model::ExtractedFile;

/// Reads a batch of files with bounded concurrency
#[derive(Debug, Clone)]
pub struct FileMaterializer {
    fs: Arc<dyn Filesystem>,
    max_concurrent: usize,
}

impl FileMaterializer {
    pub fn new(fs: Arc<dyn Filesystem>, max_concurrent: usize) -> Self {
        Self {
            fs,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Read every path; the output follows input order and any failure fails the batch
    pub async fn materialize(
        &self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedFile>, RetrievalError> {
        let mut results: Vec<(usize, ExtractedFile)> = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| {
                let fs = Arc::clone(&self.fs);
                async move {
                    let content = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
                        read = fs.read_text(path) => read?,
                    };
                    debug!("Read {:?} ({} chars)", path, content.len());
                    Ok((
                        index,
                        ExtractedFile {
                            filename: file_name(path),
                            content,
                        },
                    ))
                }
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        // Completion order is arbitrary
        results.sort_by_key(|(index, _)| *index);

        Ok(results.into_iter().map(|(_, file)| file).collect())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
