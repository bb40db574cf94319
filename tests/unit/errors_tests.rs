/*!
 * Tests for the error taxonomy
 */

use std::io;
use subfetch::errors::{ArchiveError, ProviderError, RetrievalError};

/// Test that pipeline outcomes stay distinguishable from I/O failures
#[test]
fn test_is_io_error_withEachVariant_shouldClassifyCorrectly() {
    assert!(!RetrievalError::NoSearchResult("Heat".into()).is_io_error());
    assert!(
        !RetrievalError::NoCandidate {
            language: "English".into(),
            hearing_impaired: true
        }
        .is_io_error()
    );
    assert!(!RetrievalError::NoDownloadLink("https://x".into()).is_io_error());
    assert!(!RetrievalError::Cancelled.is_io_error());

    assert!(RetrievalError::from(ProviderError::ConnectionError("reset".into())).is_io_error());
    assert!(RetrievalError::from(ArchiveError::Corrupt("bad header".into())).is_io_error());
    assert!(RetrievalError::from(io::Error::new(io::ErrorKind::NotFound, "gone")).is_io_error());
    assert!(RetrievalError::Timeout { stage: "download", secs: 120 }.is_io_error());
}

/// Test which failures are worth retrying
#[test]
fn test_is_retryable_withTransientAndPermanentErrors_shouldDiffer() {
    assert!(RetrievalError::from(ProviderError::ConnectionError("reset".into())).is_retryable());
    assert!(RetrievalError::from(ProviderError::RateLimitExceeded("slow down".into())).is_retryable());
    assert!(
        RetrievalError::from(ProviderError::ApiError {
            status_code: 503,
            message: "unavailable".into()
        })
        .is_retryable()
    );
    assert!(RetrievalError::Timeout { stage: "search", secs: 30 }.is_retryable());

    assert!(
        !RetrievalError::from(ProviderError::ApiError {
            status_code: 404,
            message: "missing".into()
        })
        .is_retryable()
    );
    assert!(!RetrievalError::from(ProviderError::AuthenticationError("bad key".into())).is_retryable());
    assert!(!RetrievalError::from(ArchiveError::Corrupt("bad".into())).is_retryable());
    assert!(!RetrievalError::NoSearchResult("Heat".into()).is_retryable());
}

/// Test error messages
#[test]
fn test_display_withPipelineErrors_shouldDescribeCause() {
    let err = RetrievalError::NoCandidate {
        language: "English".into(),
        hearing_impaired: true,
    };
    assert_eq!(err.to_string(), "No candidate subtitle in English (hearing impaired: true)");

    let err = RetrievalError::Timeout { stage: "download", secs: 120 };
    assert_eq!(err.to_string(), "download timed out after 120s");

    let err = RetrievalError::from(ProviderError::ApiError {
        status_code: 500,
        message: "boom".into(),
    });
    assert!(err.to_string().contains("500 - boom"));
}

/// Test that zip I/O failures keep their io::Error
#[test]
fn test_archive_error_fromZipError_shouldPreserveIo() {
    let zip_io = zip::result::ZipError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
    assert!(matches!(ArchiveError::from(zip_io), ArchiveError::Io(_)));

    let zip_invalid = zip::result::ZipError::InvalidArchive("bad central directory".into());
    assert!(matches!(ArchiveError::from(zip_invalid), ArchiveError::Corrupt(_)));
}
