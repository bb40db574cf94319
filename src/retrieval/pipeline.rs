/*!
 * End-to-end subtitle retrieval.
 *
 * `SubtitleRetriever` runs the stages in sequence:
 * search → rank → listing → filter → fetch (download, extract, read back).
 * Each stage either completes or fails the whole run; progress events are
 * emitted in stage order to the caller's listener.
 */

use log::{debug, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::errors::RetrievalError;
use crate::providers::{ArchiveReader, ArchiveSource, DocumentSource, Filesystem, SearchProvider};

use super::extraction::ArchiveExtractor;
use super::fetcher::ArchiveFetcher;
use super::listing::parse_listing;
use super::materialize::FileMaterializer;
use super::model::ExtractedFile;
use super::network::{NetworkPolicy, bounded, with_retry};
use super::progress::{ProgressEvent, ProgressListener};
use super::ranking::rank_search_hits;
use super::scratch::ScratchProvider;
use super::selection::{SelectionCriteria, filter_candidates};

/// The external capabilities a retrieval depends on
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchProvider>,
    pub documents: Arc<dyn DocumentSource>,
    pub archives: Arc<dyn ArchiveSource>,
    pub archive_reader: Arc<dyn ArchiveReader>,
    pub filesystem: Arc<dyn Filesystem>,
    pub scratch: Arc<dyn ScratchProvider>,
}

/// Immutable knobs for one retriever
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Root every site-relative link is resolved against
    pub base_url: Url,
    pub criteria: SelectionCriteria,
    pub network: NetworkPolicy,
    /// Upper bound on concurrent file reads
    pub concurrent_reads: usize,
    /// Leave the scratch directory on disk after the run
    pub keep_scratch: bool,
}

impl RetrievalSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            criteria: SelectionCriteria::default(),
            network: NetworkPolicy::default(),
            concurrent_reads: 8,
            keep_scratch: true,
        }
    }
}

/// Retrieves the subtitle files of a movie
#[derive(Debug, Clone)]
pub struct SubtitleRetriever {
    search: Arc<dyn SearchProvider>,
    documents: Arc<dyn DocumentSource>,
    fetcher: ArchiveFetcher,
    settings: RetrievalSettings,
}

impl SubtitleRetriever {
    pub fn new(collaborators: Collaborators, settings: RetrievalSettings) -> Self {
        let extractor = ArchiveExtractor::new(
            Arc::clone(&collaborators.archive_reader),
            Arc::clone(&collaborators.filesystem),
        );
        let materializer = FileMaterializer::new(
            Arc::clone(&collaborators.filesystem),
            settings.concurrent_reads,
        );
        let fetcher = ArchiveFetcher::new(
            settings.base_url.clone(),
            Arc::clone(&collaborators.documents),
            collaborators.archives,
            collaborators.filesystem,
            collaborators.scratch,
            extractor,
            materializer,
            settings.network.clone(),
        )
        .with_keep_scratch(settings.keep_scratch);

        Self {
            search: collaborators.search,
            documents: collaborators.documents,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Find, download and read the subtitle files for `movie_name`
    pub async fn find(
        &self,
        movie_name: &str,
        listener: &dyn ProgressListener,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedFile>, RetrievalError> {
        let policy = &self.settings.network;
        info!("Searching subtitles for '{}'", movie_name);

        let hits = with_retry("search", policy.timeout, policy, cancel, move || async move {
            Ok::<_, RetrievalError>(self.search.search(movie_name).await?)
        })
        .await?;
        if hits.is_empty() {
            return Err(RetrievalError::NoSearchResult(movie_name.to_string()));
        }
        listener.on_progress(&ProgressEvent::SearchResultsFound { count: hits.len() });

        let hit = rank_search_hits(&hits, movie_name)?;
        debug!("Selected index page '{}' at {}", hit.title, hit.link);

        let page_url = Url::parse(&hit.link).map_err(|e| RetrievalError::invalid_url(&hit.link, e))?;
        let html = bounded("listing fetch", policy.timeout, cancel, async {
            Ok::<_, RetrievalError>(self.documents.fetch_html(&page_url).await?)
        })
        .await?;

        let records = parse_listing(&html);
        listener.on_progress(&ProgressEvent::ListingParsed { count: records.len() });

        let candidates = match filter_candidates(&records, &self.settings.criteria) {
            Ok(candidates) => candidates,
            Err(e) => {
                listener.on_progress(&ProgressEvent::CandidatesFiltered { count: 0 });
                return Err(e);
            }
        };
        listener.on_progress(&ProgressEvent::CandidatesFiltered { count: candidates.len() });

        let candidate = &candidates[0];
        info!("Using '{}' ({}, {})", candidate.name, candidate.language, candidate.quality);

        let files = self.fetcher.fetch(candidate, listener, cancel).await?;
        info!("Retrieved {} subtitle file(s) for '{}'", files.len(), movie_name);

        Ok(files)
    }
}
