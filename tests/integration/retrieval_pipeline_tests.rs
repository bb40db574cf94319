/*!
 * End-to-end retrieval tests: mocked network, real zip archives on local disk
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use subfetch::errors::RetrievalError;
use subfetch::file_utils::FileManager;
use subfetch::providers::mock::{MockBehavior, MockSearchProvider};
use subfetch::retrieval::scratch::{ARCHIVE_FILE_NAME, OUTPUT_DIR_NAME, SCRATCH_PREFIX};
use subfetch::retrieval::{ExtractedFile, ProgressEvent, RecordingProgress, SubtitleRetriever};
use crate::common;

fn retriever(scratch_root: &Path, search: MockSearchProvider, archive: Vec<u8>) -> SubtitleRetriever {
    common::init_test_logging();
    SubtitleRetriever::new(
        common::collaborators(scratch_root, search, archive),
        common::settings(),
    )
}

fn scratch_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(FileManager::list_children(root)?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy().starts_with(SCRATCH_PREFIX)))
        .collect())
}

/// Test the whole pipeline against the sample listing and archive
#[tokio::test]
async fn test_find_withSampleSite_shouldReturnSrtFilesInArchiveOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        common::sample_archive()?,
    );

    let files = retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await?;

    assert_eq!(
        files,
        vec![
            ExtractedFile {
                filename: "The.Matrix.1999.cd1.srt".to_string(),
                content: common::SAMPLE_SRT.to_string(),
            },
            ExtractedFile {
                filename: "The.Matrix.1999.cd2.srt".to_string(),
                content: "1\n00:00:01,000 --> 00:00:02,000\nThere is no spoon.\n".to_string(),
            },
        ]
    );

    Ok(())
}

/// Test the on-disk scratch layout left behind by default
#[tokio::test]
async fn test_find_withDefaultSettings_shouldKeepScratchLayout() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        common::sample_archive()?,
    );

    retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await?;

    let dirs = scratch_dirs(temp_dir.path())?;
    assert_eq!(dirs.len(), 1);

    let scratch = &dirs[0];
    assert!(FileManager::file_exists(scratch.join(ARCHIVE_FILE_NAME)));

    let out = FileManager::list_children(scratch.join(OUTPUT_DIR_NAME))?;
    let names: Vec<String> = out
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    // README.txt is never written and extras/ is never created
    assert_eq!(names, vec!["The.Matrix.1999.cd1.srt", "The.Matrix.1999.cd2.srt"]);

    Ok(())
}

/// Test that scratch is released when not kept
#[tokio::test]
async fn test_find_withoutKeepScratch_shouldReleaseScratch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut settings = common::settings();
    settings.keep_scratch = false;
    let retriever = SubtitleRetriever::new(
        common::collaborators(
            temp_dir.path(),
            MockSearchProvider::working(common::matrix_hits()),
            common::sample_archive()?,
        ),
        settings,
    );

    let files = retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await?;

    assert_eq!(files.len(), 2);
    assert!(scratch_dirs(temp_dir.path())?.is_empty());

    Ok(())
}

/// Test that two runs give identical results in distinct scratch directories
#[tokio::test]
async fn test_find_twice_withSameCollaborators_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        common::sample_archive()?,
    );
    let cancel = CancellationToken::new();

    let first = retriever.find("The Matrix", &RecordingProgress::new(), &cancel).await?;
    let second = retriever.find("The Matrix", &RecordingProgress::new(), &cancel).await?;

    assert_eq!(first, second);
    assert_eq!(scratch_dirs(temp_dir.path())?.len(), 2);

    Ok(())
}

/// Test progress event order and payloads
#[tokio::test]
async fn test_find_shouldEmitProgressEventsInStageOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        common::sample_archive()?,
    );
    let progress = RecordingProgress::new();

    retriever.find("The Matrix", &progress, &CancellationToken::new()).await?;

    let events = progress.events();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0], ProgressEvent::SearchResultsFound { count: 3 });
    assert_eq!(events[1], ProgressEvent::ListingParsed { count: 4 });
    assert_eq!(events[2], ProgressEvent::CandidatesFiltered { count: 2 });
    assert_eq!(
        events[3],
        ProgressEvent::DownloadLinkResolved {
            url: common::ARCHIVE_URL.to_string()
        }
    );
    match &events[4] {
        ProgressEvent::ArchiveDownloaded { path } => {
            assert!(path.starts_with(temp_dir.path()));
            assert!(path.ends_with(ARCHIVE_FILE_NAME));
        }
        other => panic!("expected ArchiveDownloaded, got {:?}", other),
    }

    Ok(())
}

/// Test that a closure works as a listener
#[tokio::test]
async fn test_find_withClosureListener_shouldReceiveEvents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        common::sample_archive()?,
    );
    let seen = std::sync::atomic::AtomicUsize::new(0);
    let listener = |_: &ProgressEvent| {
        seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    };

    retriever.find("The Matrix", &listener, &CancellationToken::new()).await?;

    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 5);

    Ok(())
}

/// Test that an empty search fails before any side effect
#[tokio::test]
async fn test_find_withNoSearchHits_shouldFailWithNoSearchResult() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::new(MockBehavior::Empty, common::matrix_hits()),
        common::sample_archive()?,
    );
    let progress = RecordingProgress::new();

    let result = retriever.find("The Matrix", &progress, &CancellationToken::new()).await;

    assert!(matches!(result, Err(RetrievalError::NoSearchResult(_))));
    assert!(progress.events().is_empty());
    assert!(scratch_dirs(temp_dir.path())?.is_empty());

    Ok(())
}

/// Test that hits without an index page fail after reporting the search
#[tokio::test]
async fn test_find_withOnlyUnrelatedHits_shouldFailWithNoSearchResult() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let hits = vec![subfetch::retrieval::SearchHit::new("The Matrix - IMDb", "https://www.imdb.com/")];
    let retriever = retriever(temp_dir.path(), MockSearchProvider::working(hits), common::sample_archive()?);
    let progress = RecordingProgress::new();

    let result = retriever.find("The Matrix", &progress, &CancellationToken::new()).await;

    assert!(matches!(result, Err(RetrievalError::NoSearchResult(_))));
    assert_eq!(progress.events(), vec![ProgressEvent::SearchResultsFound { count: 1 }]);

    Ok(())
}

/// Test that transient search failures are retried
#[tokio::test]
async fn test_find_withFlakySearch_shouldRetryAndSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::new(MockBehavior::FailFirst { failures: 2 }, common::matrix_hits()),
        common::sample_archive()?,
    );

    let files = retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await?;

    assert_eq!(files.len(), 2);

    Ok(())
}

/// Test that a failing search surfaces as an I/O class error once retries run out
#[tokio::test]
async fn test_find_withFailingSearch_shouldFailAsIoError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(temp_dir.path(), MockSearchProvider::failing(), common::sample_archive()?);

    let err = retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_io_error());
    assert!(matches!(err, RetrievalError::Provider(_)));

    Ok(())
}

/// Test that a broken archive fails the run after the download is reported
#[tokio::test]
async fn test_find_withCorruptArchive_shouldFailAfterDownload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        b"PK\x03\x04 this is not really a zip".to_vec(),
    );
    let progress = RecordingProgress::new();

    let err = retriever
        .find("The Matrix", &progress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_io_error());
    assert!(matches!(err, RetrievalError::Archive(_)));
    assert_eq!(progress.events().len(), 5);

    Ok(())
}

/// Test that archives without subtitles yield an empty result
#[tokio::test]
async fn test_find_withArchiveWithoutSrt_shouldReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = common::build_zip(&[
        ("readme.nfo", Some(b"release notes".as_slice())),
        ("subs/", None),
        ("subs/nested.srt", Some(b"nested".as_slice())),
    ])?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::working(common::matrix_hits()),
        archive,
    );

    let files = retriever
        .find("The Matrix", &RecordingProgress::new(), &CancellationToken::new())
        .await?;

    assert!(files.is_empty());

    Ok(())
}

/// Test that a cancelled token stops the run
#[tokio::test]
async fn test_find_withCancelledToken_shouldFailWithCancelled() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let retriever = retriever(
        temp_dir.path(),
        MockSearchProvider::new(MockBehavior::Slow { delay_ms: 5_000 }, common::matrix_hits()),
        common::sample_archive()?,
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = retriever.find("The Matrix", &RecordingProgress::new(), &cancel).await;

    assert!(matches!(result, Err(RetrievalError::Cancelled)));

    Ok(())
}
