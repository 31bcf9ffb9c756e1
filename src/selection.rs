//! Candidate ranking. One rule: more pixels wins.

use crate::retrieval::ImageCandidate;

/// Picks the highest-resolution candidate, consuming the pool.
///
/// Returns `None` for an empty pool. When several candidates tie on
/// resolution the last one in input order wins; callers that care about a
/// specific tie-break should disambiguate upstream.
///
/// No I/O and no dependence on arrival order beyond the tie-break, so a
/// concurrent retriever does not change the outcome for distinct
/// resolutions.
pub fn select_best(candidates: Vec<ImageCandidate>) -> Option<ImageCandidate> {
    candidates.into_iter().max_by_key(|c| c.resolution)
}
