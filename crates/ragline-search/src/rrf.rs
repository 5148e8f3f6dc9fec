//! Reciprocal Rank Fusion (RRF) for combining search results.

use std::collections::HashMap;

use tracing::debug;

use ragline_core::{defaults, SearchHit};

/// Fuse multiple ranked lists using Reciprocal Rank Fusion.
///
/// Each input list is ranked best-first. A document's fused score is the sum
/// of `1 / (k + rank + 1)` over every list it appears in, normalized to the
/// 0.0-1.0 range. Ties keep the order in which documents were first seen.
pub fn rrf_fuse(ranked_lists: Vec<Vec<SearchHit>>, limit: usize) -> Vec<SearchHit> {
    rrf_fuse_with_k(ranked_lists, limit, defaults::RRF_K)
}

/// [`rrf_fuse`] with an explicit `k` constant.
pub fn rrf_fuse_with_k(ranked_lists: Vec<Vec<SearchHit>>, limit: usize, k: f32) -> Vec<SearchHit> {
    let num_lists = ranked_lists.iter().filter(|l| !l.is_empty()).count();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<(SearchHit, f32)> = Vec::new();

    for list in ranked_lists {
        for (rank, hit) in list.into_iter().enumerate() {
            let rrf_score = 1.0 / (k + (rank as f32) + 1.0);
            match slots.get(&hit.document.id) {
                Some(&slot) => fused[slot].1 += rrf_score,
                None => {
                    slots.insert(hit.document.id.clone(), fused.len());
                    fused.push((hit, rrf_score));
                }
            }
        }
    }

    if fused.is_empty() {
        return Vec::new();
    }

    // Best possible score: rank 0 in every non-empty list.
    let max_possible_score = num_lists as f32 / (k + 1.0);

    // Stable sort keeps first-seen order for equal scores.
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);

    let results: Vec<SearchHit> = fused
        .into_iter()
        .map(|(mut hit, score)| {
            let normalized = if max_possible_score > 0.0 {
                (score / max_possible_score).min(1.0)
            } else {
                0.0
            };
            hit.score = Some(normalized as f64);
            hit
        })
        .collect();

    debug!(
        input_lists = num_lists,
        rrf_k = k,
        result_count = results.len(),
        "RRF fusion complete"
    );

    results
}
