use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{CandidateUser, PublicProfile, Ride, RideId, RideIdError, UserId};
use super::eligibility::eligible_candidates;
use super::ranking::rank;
use super::repository::{CandidateCriteria, RepositoryError, RideRepository, UserRepository};
use super::scoring::{rule_score, MatchMode, ScoreResult, SemanticScorer, SemanticScores};

/// Validated match request issued by an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    pub ride_id: RideId,
    pub use_ai: bool,
}

impl MatchRequest {
    pub fn parse(ride_id: &str, use_ai: bool) -> Result<Self, MatchServiceError> {
        Ok(Self {
            ride_id: RideId::parse(ride_id)?,
            use_ai,
        })
    }
}

/// Service composing the ride/user stores, the scorers, and the ranker for one request.
pub struct MatchService<R, U> {
    rides: Arc<R>,
    users: Arc<U>,
    semantic: Option<SemanticScorer>,
}

impl<R, U> MatchService<R, U>
where
    R: RideRepository + 'static,
    U: UserRepository + 'static,
{
    /// `semantic` is the embedding capability; `None` serves every request rule-only.
    pub fn new(rides: Arc<R>, users: Arc<U>, semantic: Option<SemanticScorer>) -> Self {
        Self {
            rides,
            users,
            semantic,
        }
    }

    pub fn semantic_configured(&self) -> bool {
        self.semantic.is_some()
    }

    /// Produce the ranked shortlist for a ride on behalf of its host.
    pub async fn find_matches(
        &self,
        caller: &UserId,
        request: MatchRequest,
    ) -> Result<MatchOutcome, MatchServiceError> {
        let MatchRequest { ride_id, use_ai } = request;
        info!(%ride_id, use_ai, "match request received");

        let ride = self
            .rides
            .find_ride_by_id(&ride_id)
            .map_err(|source| internal(&ride_id, source))?
            .ok_or_else(|| MatchServiceError::NotFound(ride_id.clone()))?;

        if &ride.host_id != caller {
            warn!(%ride_id, %caller, "match request from non-host rejected");
            return Err(MatchServiceError::Forbidden);
        }

        let population = self
            .users
            .find_candidate_users(&CandidateCriteria::for_ride(&ride))
            .map_err(|source| internal(&ride_id, source))?;
        let eligible = eligible_candidates(&ride, population);
        info!(%ride_id, candidates = eligible.len(), "eligible candidates collected");

        let rule_scores: Vec<u8> = eligible
            .iter()
            .map(|candidate| rule_score(candidate, &ride))
            .collect();

        let (mode, semantic_scores) = self.semantic_pass(&ride, &eligible, use_ai).await;

        let results: Vec<ScoreResult> = eligible
            .into_iter()
            .zip(rule_scores)
            .map(|(candidate, rule)| {
                let ai = semantic_scores
                    .as_ref()
                    .and_then(|scores| scores.get(&candidate.id).copied());
                ScoreResult::new(candidate, rule, ai)
            })
            .collect();

        Ok(MatchOutcome {
            ride_id,
            mode,
            matches: rank(results, mode),
        })
    }

    /// Either every candidate gets a semantic score or none does.
    async fn semantic_pass(
        &self,
        ride: &Ride,
        eligible: &[CandidateUser],
        use_ai: bool,
    ) -> (MatchMode, Option<SemanticScores>) {
        if !use_ai {
            return (MatchMode::RuleBased, None);
        }

        let Some(scorer) = self.semantic.as_ref() else {
            warn!(
                ride_id = %ride.id,
                "semantic scoring requested but no embedding service configured"
            );
            return (MatchMode::RuleBasedFallback, None);
        };

        match scorer.score(ride, eligible).await {
            Ok(scores) => (MatchMode::Semantic, Some(scores)),
            Err(err) => {
                warn!(
                    ride_id = %ride.id,
                    candidates = eligible.len(),
                    error = %err,
                    "semantic scoring failed; falling back to rule-based ranking"
                );
                (MatchMode::RuleBasedFallback, None)
            }
        }
    }
}

fn internal(ride_id: &RideId, source: RepositoryError) -> MatchServiceError {
    error!(%ride_id, error = %source, "match engine failure");
    MatchServiceError::Internal(source)
}

/// Ranked shortlist together with the scoring mode actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub ride_id: RideId,
    pub mode: MatchMode,
    pub matches: Vec<ScoreResult>,
}

impl MatchOutcome {
    pub fn response(&self) -> MatchResponse {
        let matches = self
            .matches
            .iter()
            .map(|result| {
                let user = result.candidate.public_profile();
                if self.mode.semantic_applied() {
                    MatchEntry::Semantic(SemanticMatchView {
                        user,
                        rule_score: result.rule_score,
                        ai_score: result.ai_score,
                        final_score: result.final_score,
                    })
                } else {
                    MatchEntry::RuleBased(RuleMatchView {
                        user,
                        score: result.rule_score,
                    })
                }
            })
            .collect();

        MatchResponse {
            mode: self.mode,
            matches,
        }
    }
}

/// Public response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResponse {
    pub mode: MatchMode,
    pub matches: Vec<MatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatchEntry {
    RuleBased(RuleMatchView),
    Semantic(SemanticMatchView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleMatchView {
    pub user: PublicProfile,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticMatchView {
    pub user: PublicProfile,
    pub rule_score: u8,
    pub ai_score: u8,
    pub final_score: u8,
}

/// Error raised by the match service. Embedding failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum MatchServiceError {
    #[error("invalid match request: {0}")]
    Validation(String),
    #[error("ride {0} not found")]
    NotFound(RideId),
    #[error("only the ride host may request matches")]
    Forbidden,
    #[error("match engine failure")]
    Internal(#[source] RepositoryError),
}

impl From<RideIdError> for MatchServiceError {
    fn from(value: RideIdError) -> Self {
        Self::Validation(value.to_string())
    }
}
