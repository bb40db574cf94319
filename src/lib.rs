/*!
 * # subfetch - subtitle retrieval for a named movie
 *
 * A Rust library that finds, downloads and unpacks subtitle files for a movie.
 *
 * ## Features
 *
 * - Locate the movie's subtitle index page through a web search provider
 * - Parse the index listing into structured subtitle records
 * - Select an entry by language label and hearing-impaired flag
 * - Stream the entry's archive to disk and extract only `.srt` files,
 *   one entry at a time
 * - Read the extracted files back concurrently, in archive order
 * - Timeouts, bounded retry and cancellation around every network stage
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `retrieval`: The retrieval pipeline:
 *   - `retrieval::ranking`: Search result ranking
 *   - `retrieval::listing`: Listing page scraping
 *   - `retrieval::selection`: Candidate filtering
 *   - `retrieval::extraction`: Selective archive extraction
 *   - `retrieval::materialize`: Concurrent file read-back
 *   - `retrieval::fetcher`: Archive download and unpacking
 *   - `retrieval::pipeline`: End-to-end orchestration
 * - `providers`: Collaborator contracts and their implementations:
 *   - `providers::google`: Google Custom Search client
 *   - `providers::http`: HTTP page and archive client
 *   - `providers::zip_reader`: Zip archive reader
 *   - `providers::local_fs`: Local filesystem
 *   - `providers::mock`: Scriptable fakes for tests
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod retrieval;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use retrieval::{ExtractedFile, ProgressEvent, ProgressListener, SubtitleRetriever};
pub use language_utils::{get_language_name, listing_label, normalize_to_part2t};
pub use errors::{ArchiveError, ProviderError, RetrievalError};
