/*!
 * Tests for the collaborator implementations
 */

use anyhow::Result;
use std::fs;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

use subfetch::errors::{ArchiveError, ProviderError};
use subfetch::providers::google::GoogleSearch;
use subfetch::providers::local_fs::LocalFilesystem;
use subfetch::providers::mock::{MockBehavior, MockSearchProvider, MockArchiveSource};
use subfetch::providers::zip_reader::ZipArchiveReader;
use subfetch::providers::{ArchiveReader, ArchiveSource, Filesystem, SearchProvider};
use subfetch::retrieval::SearchHit;
use crate::common;

/// Test that the zip cursor enumerates entries in archive order
#[test]
fn test_zip_reader_withSampleArchive_shouldEnumerateEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive_path = temp_dir.path().join("subtitle.zip");
    fs::write(&archive_path, common::sample_archive()?)?;

    let mut cursor = ZipArchiveReader.open(&archive_path)?;
    let mut entries = Vec::new();
    while let Some(entry) = cursor.next_entry()? {
        entries.push((entry.path.clone(), entry.is_directory()));
    }

    assert_eq!(
        entries,
        vec![
            ("The.Matrix.1999.cd1.srt".to_string(), false),
            ("README.txt".to_string(), false),
            ("extras/".to_string(), true),
            ("The.Matrix.1999.cd2.srt".to_string(), false),
        ]
    );

    Ok(())
}

/// Test reading the current entry
#[test]
fn test_zip_reader_readEntry_shouldReturnCurrentEntryContents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive_path = temp_dir.path().join("subtitle.zip");
    fs::write(&archive_path, common::sample_archive()?)?;

    let mut cursor = ZipArchiveReader.open(&archive_path)?;

    // Nothing to read before the first advance
    assert!(cursor.read_entry().is_err());

    let first = cursor.next_entry()?.expect("first entry");
    assert!(first.is_subtitle());
    assert_eq!(cursor.read_entry()?, common::SAMPLE_SRT.as_bytes());

    Ok(())
}

/// Test that a file that is not a zip archive is rejected
#[test]
fn test_zip_reader_withGarbage_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "subtitle.zip", "<html>rate limited</html>")?;

    let result = ZipArchiveReader.open(&path);
    assert!(matches!(result, Err(ArchiveError::Corrupt(_)) | Err(ArchiveError::Io(_))));

    let missing = ZipArchiveReader.open(&temp_dir.path().join("missing.zip"));
    assert!(matches!(missing, Err(ArchiveError::Open(_))));

    Ok(())
}

/// Test the local filesystem contract
#[tokio::test]
async fn test_local_filesystem_withScratchLayout_shouldBehaveLikeContract() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let fs_impl = LocalFilesystem;
    let scratch = temp_dir.path().join("scrap_subtitle_test");

    fs_impl.create_dir(&scratch).await?;
    assert!(fs_impl.create_dir(&scratch).await.is_err());

    let mut writer = fs_impl.create_file(&scratch.join("b.srt")).await?;
    writer.write_all(b"caf\xE9").await?;
    writer.shutdown().await?;
    let mut writer = fs_impl.create_file(&scratch.join("a.srt")).await?;
    writer.write_all(b"plain").await?;
    writer.shutdown().await?;

    let listed = fs_impl.list_dir(&scratch).await?;
    assert_eq!(listed, vec![scratch.join("a.srt"), scratch.join("b.srt")]);

    assert_eq!(fs_impl.read_text(&scratch.join("b.srt")).await?, "caf\u{FFFD}");

    fs_impl.remove_dir_all(&scratch).await?;
    assert!(!scratch.exists());

    Ok(())
}

/// Test Custom Search response parsing
#[test]
fn test_google_parse_response_withItems_shouldKeepOrder() -> Result<()> {
    let body = r#"{
        "kind": "customsearch#search",
        "items": [
            { "title": "Subtitles for The Matrix - Subscene", "link": "https://subscene.com/subtitles/the-matrix", "snippet": "..." },
            { "title": "The Matrix - IMDb", "link": "https://www.imdb.com/title/tt0133093/" }
        ]
    }"#;

    let hits = GoogleSearch::parse_response(body)?;

    assert_eq!(
        hits,
        vec![
            SearchHit::new("Subtitles for The Matrix - Subscene", "https://subscene.com/subtitles/the-matrix"),
            SearchHit::new("The Matrix - IMDb", "https://www.imdb.com/title/tt0133093/"),
        ]
    );

    Ok(())
}

/// Test that an unreachable endpoint surfaces as a provider error
#[tokio::test]
async fn test_google_search_withUnreachableEndpoint_shouldFail() {
    let search = GoogleSearch::new("key", "cx", "http://127.0.0.1:9/customsearch/v1", Duration::from_secs(2));

    let result = search.search("The Matrix").await;

    assert!(result.is_err());
}

/// Test the scripted search provider
#[tokio::test]
async fn test_mock_search_withFailFirst_shouldRecoverAndRecordQueries() {
    let provider = MockSearchProvider::new(
        MockBehavior::FailFirst { failures: 1 },
        common::matrix_hits(),
    );

    assert!(matches!(
        provider.search("The Matrix").await,
        Err(ProviderError::ConnectionError(_))
    ));
    assert_eq!(provider.search("The Matrix").await.unwrap().len(), 3);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(provider.queries(), vec!["The Matrix", "The Matrix"]);
}

/// Test that the mock archive source streams the registered payload
#[tokio::test]
async fn test_mock_archive_source_shouldStreamRegisteredBytes() -> Result<()> {
    use futures::StreamExt;

    let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
    let source = MockArchiveSource::working().with_archive(common::ARCHIVE_URL, payload.clone());

    let mut stream = source.open_stream(&Url::parse(common::ARCHIVE_URL)?).await?;
    let mut received = Vec::new();
    while let Some(chunk) = stream.next().await {
        received.extend_from_slice(&chunk?);
    }
    assert_eq!(received, payload);

    let missing = source.open_stream(&Url::parse("https://subscene.com/none")?).await;
    assert!(matches!(missing, Err(ProviderError::ApiError { status_code: 404, .. })));

    Ok(())
}
