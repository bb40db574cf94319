/*!
 * Collaborator contracts used by the retrieval pipeline.
 *
 * Each external capability the pipeline depends on is a narrow trait so any
 * backend with the same shape can be substituted:
 * - `SearchProvider`: web search returning ranked `{title, link}` hits
 * - `DocumentSource`: fetches a page's raw HTML
 * - `ArchiveSource`: opens a URL as a byte stream
 * - `ArchiveReader` / `EntryCursor`: forward-only archive entry enumeration
 * - `Filesystem`: directory creation, write streams, listing and reads
 *
 * Live implementations live in `google`, `http`, `zip_reader` and `local_fs`;
 * `mock` holds scriptable fakes for tests.
 */

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWrite;
use url::Url;

use crate::errors::{ArchiveError, ProviderError};
use crate::retrieval::model::{ArchiveEntry, SearchHit};

/// Stream of body chunks for a remote archive
pub type ByteStream = BoxStream<'static, Result<Bytes, ProviderError>>;

/// Write half handed out by a `Filesystem`
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Web search collaborator
///
/// Credentials are bound at construction; callers only supply the query text.
#[async_trait]
pub trait SearchProvider: Send + Sync + Debug {
    /// Run a query and return hits in provider order
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Page fetching collaborator
#[async_trait]
pub trait DocumentSource: Send + Sync + Debug {
    /// Fetch the raw HTML of a page
    async fn fetch_html(&self, url: &Url) -> Result<String, ProviderError>;
}

/// Remote archive collaborator
#[async_trait]
pub trait ArchiveSource: Send + Sync + Debug {
    /// Open the archive at `url` as a stream of body chunks
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, ProviderError>;
}

/// Forward-only cursor over the entries of an opened archive
///
/// `read_entry` always refers to the entry most recently returned by
/// `next_entry`; entries that are never read are never decompressed.
pub trait EntryCursor: Send {
    /// Advance to the next entry, `None` once the archive is exhausted
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry>, ArchiveError>;

    /// Read the full contents of the current entry
    fn read_entry(&mut self) -> Result<Vec<u8>, ArchiveError>;
}

/// Archive opening collaborator
pub trait ArchiveReader: Send + Sync + Debug {
    /// Open a local file as an archive
    fn open(&self, path: &Path) -> Result<Box<dyn EntryCursor>, ArchiveError>;
}

/// Filesystem collaborator
#[async_trait]
pub trait Filesystem: Send + Sync + Debug {
    /// Create a single directory; fails if it already exists
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing parents
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create (or truncate) a file for writing
    async fn create_file(&self, path: &Path) -> io::Result<FileWriter>;

    /// List the direct children of a directory, sorted by path
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read a whole file as text; invalid UTF-8 sequences are replaced
    async fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Remove a directory tree
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

pub mod google;
pub mod http;
pub mod local_fs;
pub mod mock;
pub mod zip_reader;
