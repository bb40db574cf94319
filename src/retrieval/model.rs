/*!
 * Data model shared by the retrieval stages.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// One result returned by the search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title as reported by the provider
    pub title: String,
    /// Absolute page URL
    pub link: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Rating marker shown next to a listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Positive,
    Neutral,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// One row of a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Site-relative path of the entry's page
    pub url: String,
    /// Release name
    pub name: String,
    /// Language label exactly as rendered ("English")
    pub language: String,
    pub quality: Quality,
    /// Entry includes non-dialogue audio cues
    pub hearing_impaired: bool,
}

/// One entry of a downloaded archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive
    pub path: String,
    pub is_directory: bool,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            is_directory,
        }
    }

    /// Directory entries are flagged by the archive or end in a separator
    pub fn is_directory(&self) -> bool {
        self.is_directory || self.path.ends_with('/') || self.path.ends_with('\\')
    }

    /// Subtitle entries are non-directory entries ending in `.srt`
    pub fn is_subtitle(&self) -> bool {
        !self.is_directory() && self.path.ends_with(".srt")
    }
}

/// A subtitle file read back from the scratch directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFile {
    pub filename: String,
    pub content: String,
}
