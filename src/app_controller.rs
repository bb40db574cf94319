use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::Filesystem;
use crate::providers::google::GoogleSearch;
use crate::providers::http::HttpClient;
use crate::providers::local_fs::LocalFilesystem;
use crate::providers::zip_reader::ZipArchiveReader;
use crate::retrieval::{
    Collaborators, ExtractedFile, ProgressEvent, ProgressListener, RandomScratchProvider,
    RetrievalSettings, SubtitleRetriever,
};

// @module: Application controller for subtitle retrieval

/// Main application controller for subtitle retrieval
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrieval settings derived from the configuration
    pub fn settings(&self) -> Result<RetrievalSettings> {
        Ok(RetrievalSettings {
            base_url: self.config.base_url()?,
            criteria: self.config.selection.criteria()?,
            network: self.config.network.policy(),
            concurrent_reads: self.config.materialize.concurrent_reads,
            keep_scratch: self.config.scratch.keep,
        })
    }

    /// Live collaborators: Google search, HTTP, zip archives and the local disk
    pub fn live_collaborators(&self) -> Collaborators {
        let timeout = Duration::from_secs(self.config.network.timeout_secs);
        let http = Arc::new(HttpClient::new(timeout));
        let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem);

        Collaborators {
            search: Arc::new(GoogleSearch::new(
                self.config.search.api_key.clone(),
                self.config.search.client_id.clone(),
                self.config.search.endpoint.clone(),
                timeout,
            )),
            documents: http.clone(),
            archives: http,
            archive_reader: Arc::new(ZipArchiveReader),
            filesystem: Arc::clone(&filesystem),
            scratch: Arc::new(RandomScratchProvider::new(
                self.config.scratch.root.clone(),
                filesystem,
            )),
        }
    }

    /// Build a retriever over the given collaborators
    pub fn retriever(&self, collaborators: Collaborators) -> Result<SubtitleRetriever> {
        Ok(SubtitleRetriever::new(collaborators, self.settings()?))
    }

    /// Retrieve subtitles for `movie_name`, optionally writing them into `output_dir`
    pub async fn run(
        &self,
        movie_name: &str,
        output_dir: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<Vec<ExtractedFile>> {
        let retriever = self.retriever(self.live_collaborators())?;
        self.run_with(&retriever, movie_name, output_dir, cancel).await
    }

    /// Run a retrieval with a spinner reflecting progress events
    pub async fn run_with(
        &self,
        retriever: &SubtitleRetriever,
        movie_name: &str,
        output_dir: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<Vec<ExtractedFile>> {
        let start_time = Instant::now();
        let spinner = SpinnerProgress::new();

        let result = retriever.find(movie_name, &spinner, &cancel).await;
        spinner.finish();

        let files = result.with_context(|| format!("Failed to retrieve subtitles for '{}'", movie_name))?;

        if let Some(dir) = output_dir {
            let written = Self::save_files(&files, &dir)?;
            for path in &written {
                info!("Success: {:?}", path);
            }
        }

        info!(
            "Retrieved {} subtitle file(s) in {}.",
            files.len(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(files)
    }

    /// Write each file under `output_dir`, returning the written paths
    pub fn save_files(files: &[ExtractedFile], output_dir: &Path) -> Result<Vec<PathBuf>> {
        FileManager::ensure_dir(output_dir)?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            if !FileManager::is_flat_file_name(&file.filename) {
                warn!("Skipping file with unsafe name: {}", file.filename);
                continue;
            }
            let path = output_dir.join(&file.filename);
            FileManager::write_to_file(&path, &file.content)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Format a duration as `1h 2m 3s`, `2m 3s` or `3.4s`
    pub fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}

/// Spinner showing the latest pipeline milestone
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("Searching...");
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressListener for SpinnerProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let message = describe(event);
        self.bar.println(&message);
        self.bar.set_message(next_step(event));
    }
}

fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::SearchResultsFound { count } => format!("Found {} search result(s)", count),
        ProgressEvent::ListingParsed { count } => format!("Found {} subtitle(s)", count),
        ProgressEvent::CandidatesFiltered { count } => format!("Filtered {} candidate(s)", count),
        ProgressEvent::DownloadLinkResolved { url } => format!("Download URL: {}", url),
        ProgressEvent::ArchiveDownloaded { path } => format!("Downloaded archive to {:?}", path),
    }
}

fn next_step(event: &ProgressEvent) -> &'static str {
    match event {
        ProgressEvent::SearchResultsFound { .. } => "Reading listing...",
        ProgressEvent::ListingParsed { .. } => "Selecting candidate...",
        ProgressEvent::CandidatesFiltered { .. } => "Resolving download link...",
        ProgressEvent::DownloadLinkResolved { .. } => "Downloading archive...",
        ProgressEvent::ArchiveDownloaded { .. } => "Extracting subtitles...",
    }
}
