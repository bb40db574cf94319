/*!
 * Per-invocation scratch directories.
 */

use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::RetrievalError;
use crate::providers::Filesystem;

/// Prefix of every generated scratch directory name
pub const SCRATCH_PREFIX: &str = "scrap_subtitle_";

/// File name the downloaded archive is stored under
pub const ARCHIVE_FILE_NAME: &str = "subtitle.zip";

/// Subdirectory extracted files are written to
pub const OUTPUT_DIR_NAME: &str = "out";

/// A scratch directory owned by one retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where the downloaded archive goes
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE_NAME)
    }

    /// Where extracted files go
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR_NAME)
    }
}

/// Hands out fresh scratch directories and releases them
#[async_trait]
pub trait ScratchProvider: Send + Sync + Debug {
    /// Create a new, never reused scratch directory including its output subdirectory
    async fn create(&self) -> Result<ScratchDir, RetrievalError>;

    /// Delete a scratch directory and everything in it
    async fn release(&self, scratch: ScratchDir) -> Result<(), RetrievalError>;
}

/// Scratch provider naming directories with a random suffix under a root
#[derive(Debug, Clone)]
pub struct RandomScratchProvider {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
}

impl RandomScratchProvider {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn Filesystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    fn unique_name() -> String {
        format!("{}{}", SCRATCH_PREFIX, Uuid::new_v4().simple())
    }
}

#[async_trait]
impl ScratchProvider for RandomScratchProvider {
    async fn create(&self) -> Result<ScratchDir, RetrievalError> {
        self.fs.create_dir_all(&self.root).await?;

        let scratch = ScratchDir::new(self.root.join(Self::unique_name()));
        // create_dir fails on an existing path, so a directory is never shared
        self.fs.create_dir(scratch.path()).await?;
        self.fs.create_dir(&scratch.output_dir()).await?;

        debug!("Created scratch directory {:?}", scratch.path());
        Ok(scratch)
    }

    async fn release(&self, scratch: ScratchDir) -> Result<(), RetrievalError> {
        debug!("Releasing scratch directory {:?}", scratch.path());
        self.fs.remove_dir_all(scratch.path()).await?;
        Ok(())
    }
}
