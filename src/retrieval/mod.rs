/*!
 * The subtitle retrieval core.
 *
 * Stages, leaves first:
 * - `ranking`: picks the index page among search hits
 * - `listing`: parses the index page's table into records
 * - `selection`: keeps the records matching the language criteria
 * - `extraction`: streams `.srt` entries out of an archive one at a time
 * - `materialize`: reads extracted files concurrently, in input order
 * - `fetcher`: download link, archive download, extraction, read-back
 * - `pipeline`: runs the stages end to end
 *
 * Supporting modules: `model` (shared records), `network` (timeouts and
 * retry), `progress` (listener events) and `scratch` (per-run directories).
 */

pub mod extraction;
pub mod fetcher;
pub mod listing;
pub mod materialize;
pub mod model;
pub mod network;
pub mod pipeline;
pub mod progress;
pub mod ranking;
pub mod scratch;
pub mod selection;

pub use extraction::{ArchiveExtractor, ExtractionReport};
pub use fetcher::ArchiveFetcher;
pub use listing::{parse_download_link, parse_listing};
pub use materialize::FileMaterializer;
pub use model::{ArchiveEntry, ExtractedFile, Quality, SearchHit, SubtitleRecord};
pub use network::NetworkPolicy;
pub use pipeline::{Collaborators, RetrievalSettings, SubtitleRetriever};
pub use progress::{ProgressEvent, ProgressListener, RecordingProgress, SilentProgress};
pub use ranking::{expected_title, rank_search_hits};
pub use scratch::{RandomScratchProvider, ScratchDir, ScratchProvider};
pub use selection::{SelectionCriteria, filter_candidates};
