/*!
 * Candidate selection over parsed listing records.
 */

use crate::errors::RetrievalError;

use super::model::SubtitleRecord;

/// Label and hearing-impaired flag a listing entry must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Language label as the listing renders it
    pub language: String,
    pub hearing_impaired: bool,
}

impl SelectionCriteria {
    pub fn new(language: impl Into<String>, hearing_impaired: bool) -> Self {
        Self {
            language: language.into(),
            hearing_impaired,
        }
    }

    /// Whether a record satisfies the criteria
    pub fn matches(&self, record: &SubtitleRecord) -> bool {
        record.hearing_impaired == self.hearing_impaired && record.language == self.language
    }
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self::new("English", true)
    }
}

/// Keep the records matching `criteria`, in listing order
pub fn filter_candidates(
    records: &[SubtitleRecord],
    criteria: &SelectionCriteria,
) -> Result<Vec<SubtitleRecord>, RetrievalError> {
    let candidates: Vec<SubtitleRecord> = records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(RetrievalError::NoCandidate {
            language: criteria.language.clone(),
            hearing_impaired: criteria.hearing_impaired,
        });
    }

    Ok(candidates)
}
