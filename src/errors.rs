/*!
 * Error types for the subfetch application.
 *
 * This module contains custom error types for the collaborators and the
 * retrieval pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a remote collaborator
/// (search provider, listing site, archive host)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making a request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the remote service itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while reading a downloaded archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive file could not be opened
    #[error("Cannot open archive: {0}")]
    Open(String),

    /// The archive is structurally invalid
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    /// Reading an entry failed
    #[error("Archive read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(error: zip::result::ZipError) -> Self {
        match error {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Corrupt(other.to_string()),
        }
    }
}

/// Errors produced by the retrieval pipeline
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The search provider returned nothing usable for the movie
    #[error("No search result for '{0}'")]
    NoSearchResult(String),

    /// The listing was parsed but no row satisfies the selection criteria
    #[error("No candidate subtitle in {language} (hearing impaired: {hearing_impaired})")]
    NoCandidate {
        language: String,
        hearing_impaired: bool,
    },

    /// The candidate page has no download link
    #[error("No download link on page {0}")]
    NoDownloadLink(String),

    /// A remote collaborator failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The downloaded archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A filesystem operation failed
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// A URL could not be built or parsed
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A stage exceeded its time budget
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    /// The caller cancelled the retrieval
    #[error("Retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    /// Network, archive and filesystem failures form the I/O class of errors
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Archive(_) | Self::Io(_) | Self::InvalidUrl { .. } | Self::Timeout { .. }
        )
    }

    /// Whether a retry of the failed stage could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
