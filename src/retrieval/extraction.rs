/*!
 * Selective archive extraction.
 *
 * The extractor walks the archive with a forward-only cursor and handles one
 * entry at a time: the cursor is not advanced until the current entry's write
 * has been shut down, so memory use stays around one entry regardless of the
 * archive size. Only `.srt` files are read and written; directories are never
 * created, so only flat archives are fully supported.
 */

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::errors::RetrievalError;
use crate::file_utils::FileManager;
use crate::providers::{ArchiveReader, Filesystem};

/// Outcome of one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Files written, in archive order
    pub written: Vec<PathBuf>,
    /// Entries passed over (directories, other files, nested paths)
    pub skipped: usize,
}

/// Streams subtitle entries out of an archive into a destination directory
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    reader: Arc<dyn ArchiveReader>,
    fs: Arc<dyn Filesystem>,
}

impl ArchiveExtractor {
    pub fn new(reader: Arc<dyn ArchiveReader>, fs: Arc<dyn Filesystem>) -> Self {
        Self { reader, fs }
    }

    /// Extract every `.srt` entry of `archive` into the existing `destination`
    pub async fn extract(
        &self,
        archive: &Path,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractionReport, RetrievalError> {
        let mut cursor = self.reader.open(archive)?;
        let mut report = ExtractionReport::default();

        while let Some(entry) = cursor.next_entry()? {
            if cancel.is_cancelled() {
                return Err(RetrievalError::Cancelled);
            }

            if !entry.is_subtitle() {
                debug!("Skipping archive entry {}", entry.path);
                report.skipped += 1;
                continue;
            }

            if !FileManager::is_flat_file_name(&entry.path) {
                warn!("Skipping nested archive entry {}", entry.path);
                report.skipped += 1;
                continue;
            }

            let contents = cursor.read_entry()?;
            let target = destination.join(&entry.path);

            let mut writer = self.fs.create_file(&target).await?;
            writer.write_all(&contents).await?;
            writer.shutdown().await?;

            debug!("Extracted {} ({} bytes)", entry.path, contents.len());
            report.written.push(target);
        }

        Ok(report)
    }
}
