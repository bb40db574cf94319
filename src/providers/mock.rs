/*!
 * Mock collaborator implementations for testing.
 *
 * These fakes let the whole retrieval pipeline run without network or disk:
 * - `MockSearchProvider` - returns scripted hits, can fail or stall
 * - `MockDocumentSource` - serves HTML pages from a map
 * - `MockArchiveSource` - serves archive bytes in small chunks
 * - `MockArchiveReader` - an archive described as a list of entries
 * - `MemoryFilesystem` - an in-memory filesystem with injectable read delays
 */

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::AsyncWrite;
use url::Url;

use crate::errors::{ArchiveError, ProviderError};
use crate::providers::{
    ArchiveReader, ArchiveSource, ByteStream, DocumentSource, EntryCursor, FileWriter, Filesystem,
    SearchProvider,
};
use crate::retrieval::model::{ArchiveEntry, SearchHit};

/// Behavior mode for the network mocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails the first `failures` requests, then succeeds
    FailFirst { failures: usize },
    /// Always fails with a connection error
    Failing,
    /// Succeeds with an empty result
    Empty,
    /// Sleeps before answering (for timeout testing)
    Slow { delay_ms: u64 },
}

impl MockBehavior {
    /// Apply the behavior for the given zero-based request number
    async fn apply(&self, request_number: usize) -> Result<bool, ProviderError> {
        match *self {
            MockBehavior::Working => Ok(true),
            MockBehavior::FailFirst { failures } if request_number < failures => Err(
                ProviderError::ConnectionError(format!("simulated failure #{}", request_number + 1)),
            ),
            MockBehavior::FailFirst { .. } => Ok(true),
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "simulated connection failure".to_string(),
            )),
            MockBehavior::Empty => Ok(false),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(true)
            }
        }
    }
}

/// Search provider returning scripted hits
#[derive(Debug)]
pub struct MockSearchProvider {
    behavior: MockBehavior,
    hits: Vec<SearchHit>,
    request_count: Arc<AtomicUsize>,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new(behavior: MockBehavior, hits: Vec<SearchHit>) -> Self {
        Self {
            behavior,
            hits,
            request_count: Arc::new(AtomicUsize::new(0)),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a working provider returning `hits`
    pub fn working(hits: Vec<SearchHit>) -> Self {
        Self::new(MockBehavior::Working, hits)
    }

    /// Create a provider that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, Vec::new())
    }

    /// Number of search requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Queries received, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let request_number = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.to_string());

        if self.behavior.apply(request_number).await? {
            Ok(self.hits.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// Document source serving HTML pages keyed by URL
#[derive(Debug, Default)]
pub struct MockDocumentSource {
    pages: HashMap<String, String>,
}

impl MockDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

#[async_trait]
impl DocumentSource for MockDocumentSource {
    async fn fetch_html(&self, url: &Url) -> Result<String, ProviderError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 404,
                message: format!("no page registered for {}", url),
            })
    }
}

/// Archive source serving byte payloads keyed by URL
#[derive(Debug)]
pub struct MockArchiveSource {
    behavior: MockBehavior,
    archives: HashMap<String, Vec<u8>>,
    chunk_size: usize,
    request_count: Arc<AtomicUsize>,
}

impl MockArchiveSource {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            archives: HashMap::new(),
            chunk_size: 512,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working archive source
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Register an archive payload
    pub fn with_archive(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.into(), bytes);
        self
    }

    /// Number of download attempts received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveSource for MockArchiveSource {
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, ProviderError> {
        let request_number = self.request_count.fetch_add(1, Ordering::SeqCst);
        if !self.behavior.apply(request_number).await? {
            return Ok(futures::stream::empty().boxed());
        }

        let bytes = self
            .archives
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 404,
                message: format!("no archive registered for {}", url),
            })?;

        let chunks: Vec<Result<Bytes, ProviderError>> = bytes
            .chunks(self.chunk_size.max(1))
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// One entry of a `MockArchiveReader` archive
#[derive(Debug, Clone)]
pub struct MockEntry {
    pub path: String,
    pub is_directory: bool,
    pub content: Vec<u8>,
}

impl MockEntry {
    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            content: content.into(),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
            content: Vec::new(),
        }
    }
}

/// Archive reader serving a fixed entry list for any path
#[derive(Debug, Clone, Default)]
pub struct MockArchiveReader {
    entries: Vec<MockEntry>,
    corrupt: bool,
    reads: Arc<Mutex<Vec<String>>>,
}

impl MockArchiveReader {
    pub fn new(entries: Vec<MockEntry>) -> Self {
        Self {
            entries,
            corrupt: false,
            reads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A reader whose archives can never be opened
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    /// Paths of entries whose contents were read, in order
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }
}

impl ArchiveReader for MockArchiveReader {
    fn open(&self, path: &Path) -> Result<Box<dyn EntryCursor>, ArchiveError> {
        if self.corrupt {
            return Err(ArchiveError::Corrupt(format!(
                "invalid central directory in {}",
                path.display()
            )));
        }
        Ok(Box::new(MockEntryCursor {
            entries: self.entries.clone(),
            next_index: 0,
            reads: Arc::clone(&self.reads),
        }))
    }
}

struct MockEntryCursor {
    entries: Vec<MockEntry>,
    next_index: usize,
    reads: Arc<Mutex<Vec<String>>>,
}

impl EntryCursor for MockEntryCursor {
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry>, ArchiveError> {
        let Some(entry) = self.entries.get(self.next_index) else {
            return Ok(None);
        };
        self.next_index += 1;
        Ok(Some(ArchiveEntry::new(entry.path.clone(), entry.is_directory)))
    }

    fn read_entry(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .next_index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| ArchiveError::Corrupt("no current entry to read".to_string()))?;
        self.reads.lock().push(entry.path.clone());
        Ok(entry.content.clone())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

/// In-memory filesystem
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    state: Arc<Mutex<MemoryState>>,
    read_delays: Arc<Mutex<HashMap<PathBuf, Duration>>>,
    failing_reads: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file
    pub fn insert_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(path.into(), content.into());
    }

    /// Seed a directory
    pub fn insert_dir(&self, path: impl Into<PathBuf>) {
        self.state.lock().dirs.insert(path.into());
    }

    /// Delay every read of `path`
    pub fn delay_reads(&self, path: impl Into<PathBuf>, delay: Duration) {
        self.read_delays.lock().insert(path.into(), delay);
    }

    /// Make every read of `path` fail
    pub fn fail_reads(&self, path: impl Into<PathBuf>) {
        self.failing_reads.lock().insert(path.into());
    }

    /// Contents of a file, if present
    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }

    /// All file paths, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// All directory paths, sorted
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.state.lock().dirs.iter().cloned().collect()
    }
}

fn parent_exists(state: &MemoryState, path: &Path) -> bool {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => state.dirs.contains(parent),
        _ => true,
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        if !parent_exists(&state, path) {
            return Err(not_found(path.parent().unwrap_or(path)));
        }
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    async fn create_file(&self, path: &Path) -> io::Result<FileWriter> {
        let mut state = self.state.lock();
        if !parent_exists(&state, path) {
            return Err(not_found(path.parent().unwrap_or(path)));
        }
        state.files.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            path: path.to_path_buf(),
            buffer: Vec::new(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        let mut children: Vec<PathBuf> = state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        children.sort();
        Ok(children)
    }

    async fn read_text(&self, path: &Path) -> io::Result<String> {
        let delay = self.read_delays.lock().get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_reads.lock().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("simulated read failure for {}", path.display()),
            ));
        }
        let bytes = self.file(path).ok_or_else(|| not_found(path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        state.dirs.retain(|p| !p.starts_with(path));
        state.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

/// Buffers writes and publishes them to the filesystem on flush
struct MemoryWriter {
    path: PathBuf,
    buffer: Vec<u8>,
    state: Arc<Mutex<MemoryState>>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.state
            .lock()
            .files
            .insert(this.path.clone(), this.buffer.clone());
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}
