/*!
 * Search result ranking.
 *
 * The index site titles its movie pages "Subtitles for {movie} - Subscene".
 * An exact (case-insensitive) title match wins; otherwise the first hit that
 * still looks like an index page is accepted.
 */

use crate::errors::RetrievalError;

use super::model::SearchHit;

/// Title prefix every index page carries
pub const TITLE_PREFIX: &str = "Subtitles for ";

/// Title suffix appended by the index site
pub const TITLE_SUFFIX: &str = " - Subscene";

/// Exact title expected for `movie_name`
pub fn expected_title(movie_name: &str) -> String {
    format!("{}{}{}", TITLE_PREFIX, movie_name, TITLE_SUFFIX)
}

/// Pick the best hit for `movie_name`
pub fn rank_search_hits<'a>(
    hits: &'a [SearchHit],
    movie_name: &str,
) -> Result<&'a SearchHit, RetrievalError> {
    let expected = expected_title(movie_name).to_lowercase();

    hits.iter()
        .find(|hit| hit.title.to_lowercase() == expected)
        .or_else(|| hits.iter().find(|hit| hit.title.starts_with(TITLE_PREFIX)))
        .ok_or_else(|| RetrievalError::NoSearchResult(movie_name.to_string()))
}
