use std::collections::HashSet;

use crate::domain::assessment::{AssessmentRecord, RetrievedHit};
use crate::processing::metadata::normalize_metadata;

#[derive(Default, Debug)]
struct RankStats {
    below_threshold: usize,
    unnamed: usize,
    duplicates: usize,
}

/// Turn raw index hits into a deduplicated, thresholded result list.
///
/// Hits are visited in index order, so the first hit for a given name wins.
/// A hit is kept only when its score is strictly above `score_threshold`.
/// Processing stops once `max_results` records are accepted; `0` means
/// no cap.
pub fn rank_and_dedupe(
    hits: &[RetrievedHit],
    score_threshold: f32,
    max_results: usize,
) -> Vec<AssessmentRecord> {
    let mut stats = RankStats::default();
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for hit in hits {
        if max_results != 0 && accepted.len() >= max_results {
            break;
        }

        if hit.score.is_nan() || hit.score <= score_threshold {
            stats.below_threshold += 1;
            continue;
        }

        let Some(record) = normalize_metadata(&hit.metadata) else {
            stats.unnamed += 1;
            continue;
        };

        if !seen.insert(record.name.clone()) {
            stats.duplicates += 1;
            continue;
        }

        log::info!("Found unique assessment: {}", record.name);
        accepted.push(record);
    }

    log::debug!(
        "Ranked {} hits: accepted={}, below_threshold={}, unnamed={}, duplicates={}",
        hits.len(),
        accepted.len(),
        stats.below_threshold,
        stats.unnamed,
        stats.duplicates
    );

    accepted
}
