/*!
 * Archive retrieval for a chosen candidate.
 *
 * Resolves the candidate's download link, streams the archive into a fresh
 * scratch directory, extracts the subtitle entries and reads them back.
 */

use futures::StreamExt;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::errors::RetrievalError;
use crate::providers::{ArchiveSource, DocumentSource, Filesystem};

use super::extraction::{ArchiveExtractor, ExtractionReport};
use super::listing::parse_download_link;
use super::materialize::FileMaterializer;
use super::model::{ExtractedFile, SubtitleRecord};
use super::network::{NetworkPolicy, bounded, with_retry};
use super::progress::{ProgressEvent, ProgressListener};
use super::scratch::{ScratchDir, ScratchProvider};

/// Downloads and unpacks the archive behind a listing entry
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    base_url: Url,
    documents: Arc<dyn DocumentSource>,
    archives: Arc<dyn ArchiveSource>,
    fs: Arc<dyn Filesystem>,
    scratch: Arc<dyn ScratchProvider>,
    extractor: ArchiveExtractor,
    materializer: FileMaterializer,
    policy: NetworkPolicy,
    keep_scratch: bool,
}

impl ArchiveFetcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_url: Url,
        documents: Arc<dyn DocumentSource>,
        archives: Arc<dyn ArchiveSource>,
        fs: Arc<dyn Filesystem>,
        scratch: Arc<dyn ScratchProvider>,
        extractor: ArchiveExtractor,
        materializer: FileMaterializer,
        policy: NetworkPolicy,
    ) -> Self {
        Self {
            base_url,
            documents,
            archives,
            fs,
            scratch,
            extractor,
            materializer,
            policy,
            keep_scratch: true,
        }
    }

    /// Delete the scratch directory once the files are read (or the fetch failed)
    pub fn with_keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }

    /// Fetch `candidate`'s archive and return its subtitle files
    pub async fn fetch(
        &self,
        candidate: &SubtitleRecord,
        listener: &dyn ProgressListener,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedFile>, RetrievalError> {
        let download_url = self.resolve_download_link(candidate, cancel).await?;
        listener.on_progress(&ProgressEvent::DownloadLinkResolved {
            url: download_url.to_string(),
        });

        let scratch = self.scratch.create().await?;
        let result = self.unpack(&download_url, &scratch, listener, cancel).await;

        if !self.keep_scratch {
            if let Err(e) = self.scratch.release(scratch).await {
                warn!("Failed to release scratch directory: {}", e);
            }
        }

        result
    }

    /// Absolute URL of the archive linked from the candidate's page
    pub async fn resolve_download_link(
        &self,
        candidate: &SubtitleRecord,
        cancel: &CancellationToken,
    ) -> Result<Url, RetrievalError> {
        let page_url = join_url(&self.base_url, &candidate.url)?;
        debug!("Fetching candidate page {}", page_url);

        let html = bounded("page fetch", self.policy.timeout, cancel, async {
            Ok::<_, RetrievalError>(self.documents.fetch_html(&page_url).await?)
        })
        .await?;

        let href = parse_download_link(&html)
            .ok_or_else(|| RetrievalError::NoDownloadLink(page_url.to_string()))?;

        join_url(&self.base_url, &href)
    }

    async fn unpack(
        &self,
        download_url: &Url,
        scratch: &ScratchDir,
        listener: &dyn ProgressListener,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedFile>, RetrievalError> {
        let archive_path = scratch.archive_path();
        let size = self.download(download_url, &archive_path, cancel).await?;
        info!("Downloaded archive ({} bytes) to {:?}", size, archive_path);
        listener.on_progress(&ProgressEvent::ArchiveDownloaded {
            path: archive_path.clone(),
        });

        let output_dir = scratch.output_dir();
        let report = self.extractor.extract(&archive_path, &output_dir, cancel).await?;
        debug!(
            "Extracted {} subtitle file(s), skipped {} entr(y/ies)",
            report.written.len(),
            report.skipped
        );

        let paths = self.collect_subtitles(&output_dir, &report).await?;
        self.materializer.materialize(&paths, cancel).await
    }

    /// Stream the archive at `url` into `destination`, retrying transient failures
    async fn download(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, RetrievalError> {
        with_retry("download", self.policy.download_timeout, &self.policy, cancel, move || async move {
            let mut stream = self.archives.open_stream(url).await?;
            let mut writer = self.fs.create_file(destination).await?;
            let mut written = 0u64;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                writer.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            writer.shutdown().await?;

            Ok::<_, RetrievalError>(written)
        })
        .await
    }

    /// `.srt` files in `output_dir`, in extraction order, then any others by name
    async fn collect_subtitles(
        &self,
        output_dir: &Path,
        report: &ExtractionReport,
    ) -> Result<Vec<PathBuf>, RetrievalError> {
        let listed: Vec<PathBuf> = self
            .fs
            .list_dir(output_dir)
            .await?
            .into_iter()
            .filter(|path| path.to_string_lossy().ends_with(".srt"))
            .collect();

        let mut ordered: Vec<PathBuf> = report
            .written
            .iter()
            .filter(|path| listed.contains(path))
            .cloned()
            .collect();
        ordered.extend(listed.into_iter().filter(|path| !report.written.contains(path)));

        Ok(ordered)
    }
}

fn join_url(base: &Url, reference: &str) -> Result<Url, RetrievalError> {
    base.join(reference)
        .map_err(|e| RetrievalError::invalid_url(reference, e))
}
