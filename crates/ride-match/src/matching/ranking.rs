use std::cmp::Reverse;

use super::scoring::{MatchMode, ScoreResult};

/// Upper bound on the shortlist handed back to a host.
pub const MAX_MATCHES: usize = 5;

/// Orders results by the score in use for `mode`, highest first, and keeps the top
/// [`MAX_MATCHES`]. Equal scores keep their enumeration order.
pub fn rank(mut results: Vec<ScoreResult>, mode: MatchMode) -> Vec<ScoreResult> {
    // sort_by_key is stable
    if mode.semantic_applied() {
        results.sort_by_key(|result| Reverse(result.final_score));
    } else {
        results.sort_by_key(|result| Reverse(result.rule_score));
    }
    results.truncate(MAX_MATCHES);
    results
}
