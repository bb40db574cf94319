/*!
 * Tests for listing scraping, ranking and selection over a realistic page
 */

use subfetch::retrieval::{
    Quality, SearchHit, SelectionCriteria, filter_candidates, parse_download_link, parse_listing,
    rank_search_hits,
};
use subfetch::errors::RetrievalError;
use crate::common;

/// Test that header, ad and malformed rows are skipped
#[test]
fn test_parse_listing_withFullPage_shouldReturnDataRowsInOrder() {
    let records = parse_listing(common::LISTING_PAGE);

    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "/subtitles/the-matrix/english/100",
            "/subtitles/the-matrix/english/101",
            "/subtitles/the-matrix/french/102",
            "/subtitles/the-matrix/english/103",
        ]
    );

    assert_eq!(records[0].language, "English");
    assert_eq!(records[0].name, "The.Matrix.1999.DVDRip");
    assert_eq!(records[0].quality, Quality::Neutral);
    assert!(!records[0].hearing_impaired);

    assert_eq!(records[1].quality, Quality::Positive);
    assert!(records[1].hearing_impaired);
}

/// Test that candidate selection keeps listing order
#[test]
fn test_filter_candidates_withFullPage_shouldKeepEnglishHearingImpairedInOrder() {
    let records = parse_listing(common::LISTING_PAGE);

    let candidates = filter_candidates(&records, &SelectionCriteria::default()).unwrap();

    let urls: Vec<&str> = candidates.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["/subtitles/the-matrix/english/101", "/subtitles/the-matrix/english/103"]);
}

/// Test selection with other criteria
#[test]
fn test_filter_candidates_withFrenchCriteria_shouldSelectFrench() {
    let records = parse_listing(common::LISTING_PAGE);

    let candidates = filter_candidates(&records, &SelectionCriteria::new("French", true)).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "The.Matrix.1999.FR");

    let result = filter_candidates(&records, &SelectionCriteria::new("French", false));
    assert!(matches!(result, Err(RetrievalError::NoCandidate { .. })));
}

/// Test the download link lookup
#[test]
fn test_parse_download_link_withDownloadPage_shouldReturnHref() {
    assert_eq!(
        parse_download_link(common::DOWNLOAD_PAGE).as_deref(),
        Some("/subtitles/english-text/XyZ")
    );
    assert_eq!(parse_download_link(common::LISTING_PAGE), None);
}

/// Test ranking against the hits a provider returns
#[test]
fn test_rank_search_hits_withMixedHits_shouldPreferExactTitle() {
    let hits = common::matrix_hits();

    let hit = rank_search_hits(&hits, "The Matrix").unwrap();
    assert_eq!(hit.link, common::INDEX_URL);

    // No exact match: first index page wins
    let hit = rank_search_hits(&hits, "The Matrix Revolutions").unwrap();
    assert_eq!(hit.link, "https://subscene.com/subtitles/the-matrix-reloaded");

    let unrelated = vec![SearchHit::new("The Matrix (1999) - IMDb", "https://www.imdb.com/")];
    assert!(matches!(
        rank_search_hits(&unrelated, "The Matrix"),
        Err(RetrievalError::NoSearchResult(_))
    ));
}
