//! Passenger matching for offered rides.
//!
//! A request loads the ride, checks the caller is its host, filters the user population
//! down to eligible candidates, rule-scores each one, optionally blends in an
//! embedding-based semantic score, and returns the top of the ranking. Semantic scoring
//! is all-or-nothing: any embedding failure puts the whole request back on rule scores.

pub mod domain;
pub mod eligibility;
pub mod embedding;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CandidateUser, Gender, GenderPreference, PassengerStatus, Preferences, PublicProfile, Ride,
    RideId, RideIdError, RidePassenger, RideRoute, RoutePoint, UserId,
};
pub use eligibility::eligible_candidates;
pub use embedding::{EmbeddingClient, EmbeddingError, HttpEmbeddingClient};
pub use ranking::{rank, MAX_MATCHES};
pub use repository::{CandidateCriteria, RepositoryError, RideRepository, UserRepository};
pub use router::{match_router, MatchRequestBody, CALLER_HEADER};
pub use scoring::{
    blend, rule_components, rule_score, MatchMode, ScoreComponent, ScoreFactor, ScoreResult,
    SemanticError, SemanticScorer, SemanticScores,
};
pub use service::{
    MatchEntry, MatchOutcome, MatchRequest, MatchResponse, MatchService, MatchServiceError,
    RuleMatchView, SemanticMatchView,
};
