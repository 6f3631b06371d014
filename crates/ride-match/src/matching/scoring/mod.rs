mod blend;
mod rules;
mod semantic;

pub use blend::{blend, RULE_WEIGHT, SEMANTIC_WEIGHT};
pub use rules::{rule_components, rule_score};
pub use semantic::{
    candidate_descriptor, cosine_similarity, ride_descriptor, similarity_to_score,
    EmbeddingSubject, SemanticError, SemanticScorer, SemanticScores, MISSING_BIO_PLACEHOLDER,
};

use serde::{Deserialize, Serialize};

use super::domain::CandidateUser;

/// Rubric factor behind a rule score contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Base,
    Rating,
    Experience,
    Smoking,
    Music,
    Pets,
    EmailVerified,
}

impl ScoreFactor {
    pub const fn label(self) -> &'static str {
        match self {
            ScoreFactor::Base => "base",
            ScoreFactor::Rating => "rating",
            ScoreFactor::Experience => "experience",
            ScoreFactor::Smoking => "smoking",
            ScoreFactor::Music => "music",
            ScoreFactor::Pets => "pets",
            ScoreFactor::EmailVerified => "email verification",
        }
    }
}

/// Discrete contribution to a rule score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: f64,
    pub notes: String,
}

/// How a request was actually scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Semantic scoring was not requested.
    RuleBased,
    /// Semantic scoring was requested and applied to every candidate.
    Semantic,
    /// Semantic scoring was requested but unavailable or failed; rule scores only.
    RuleBasedFallback,
}

impl MatchMode {
    pub const fn semantic_applied(self) -> bool {
        matches!(self, MatchMode::Semantic)
    }
}

/// Per-request score for one eligible candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub candidate: CandidateUser,
    pub rule_score: u8,
    /// 0 whenever semantic scoring was not applied.
    pub ai_score: u8,
    pub final_score: u8,
}

impl ScoreResult {
    pub fn new(candidate: CandidateUser, rule_score: u8, ai_score: Option<u8>) -> Self {
        Self {
            candidate,
            rule_score,
            ai_score: ai_score.unwrap_or(0),
            final_score: blend(rule_score, ai_score),
        }
    }
}
