/*!
 * Progress notifications emitted by the retrieval pipeline.
 *
 * Listeners are observation-only: they receive each event once, in pipeline
 * order, right after the corresponding stage completes.
 */

use parking_lot::Mutex;
use std::path::PathBuf;

/// A completed pipeline milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The search provider answered with `count` hits
    SearchResultsFound { count: usize },
    /// The listing page yielded `count` records
    ListingParsed { count: usize },
    /// `count` records satisfy the selection criteria
    CandidatesFiltered { count: usize },
    /// The candidate's archive URL is known
    DownloadLinkResolved { url: String },
    /// The archive is fully written to disk
    ArchiveDownloaded { path: PathBuf },
}

/// Receiver for progress events
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressListener for SilentProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Listener that keeps every event it receives
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl ProgressListener for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}
