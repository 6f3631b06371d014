use super::rules::MAX_SCORE;

pub const RULE_WEIGHT: f64 = 0.6;
pub const SEMANTIC_WEIGHT: f64 = 0.4;

/// Final score for a candidate. Without a semantic score the rule score stands alone.
pub fn blend(rule_score: u8, ai_score: Option<u8>) -> u8 {
    match ai_score {
        Some(ai_score) => {
            let weighted =
                f64::from(rule_score) * RULE_WEIGHT + f64::from(ai_score) * SEMANTIC_WEIGHT;
            weighted.round().clamp(0.0, MAX_SCORE) as u8
        }
        None => rule_score,
    }
}
