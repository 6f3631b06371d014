use metrics_exporter_prometheus::PrometheusHandle;
use ride_match::config::AppConfig;
use ride_match::error::AppError;
use ride_match::matching::{
    CandidateCriteria, CandidateUser, HttpEmbeddingClient, MatchService, RepositoryError, Ride,
    RideId, RideRepository, SemanticScorer, UserRepository,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

const SAMPLE_FIXTURE: &str = include_str!("../fixtures/sample.json");

pub(crate) type FixtureMatchService = MatchService<InMemoryRideRepository, InMemoryUserRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed data for the in-memory stores.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Fixtures {
    #[serde(default)]
    pub(crate) rides: Vec<Ride>,
    #[serde(default)]
    pub(crate) users: Vec<CandidateUser>,
}

impl Fixtures {
    /// Reads fixtures from `path`, or the bundled sample when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(serde_json::from_str(SAMPLE_FIXTURE)?),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRideRepository {
    rides: Arc<RwLock<HashMap<RideId, Ride>>>,
}

impl InMemoryRideRepository {
    pub(crate) fn seeded(rides: Vec<Ride>) -> Self {
        let rides = rides.into_iter().map(|ride| (ride.id.clone(), ride)).collect();
        Self {
            rides: Arc::new(RwLock::new(rides)),
        }
    }
}

impl RideRepository for InMemoryRideRepository {
    fn find_ride_by_id(&self, id: &RideId) -> Result<Option<Ride>, RepositoryError> {
        let guard = self
            .rides
            .read()
            .map_err(|_| RepositoryError::Unavailable("ride store lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// User store that keeps fixture order, which the ranking relies on for ties.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<CandidateUser>>>,
}

impl InMemoryUserRepository {
    pub(crate) fn seeded(users: Vec<CandidateUser>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_candidate_users(
        &self,
        criteria: &CandidateCriteria,
    ) -> Result<Vec<CandidateUser>, RepositoryError> {
        let guard = self
            .users
            .read()
            .map_err(|_| RepositoryError::Unavailable("user store lock poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|user| criteria.admits(user))
            .cloned()
            .collect())
    }
}

/// Embedding capability from configuration; `None` when no endpoint is configured.
pub(crate) fn semantic_scorer(config: &AppConfig) -> Result<Option<SemanticScorer>, AppError> {
    let Some(embedding) = config.embedding.clone() else {
        return Ok(None);
    };

    let call_timeout = embedding.timeout;
    let client = HttpEmbeddingClient::new(embedding)?;
    Ok(Some(SemanticScorer::new(Arc::new(client), call_timeout)))
}

pub(crate) fn match_service(
    fixtures: Fixtures,
    semantic: Option<SemanticScorer>,
) -> Arc<FixtureMatchService> {
    Arc::new(MatchService::new(
        Arc::new(InMemoryRideRepository::seeded(fixtures.rides)),
        Arc::new(InMemoryUserRepository::seeded(fixtures.users)),
        semantic,
    ))
}
