use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::matching::domain::{
    CandidateUser, Gender, GenderPreference, PassengerStatus, Preferences, Ride, RideId,
    RidePassenger, RideRoute, RoutePoint, UserId,
};
use crate::matching::embedding::{EmbeddingClient, EmbeddingError};
use crate::matching::repository::{
    CandidateCriteria, RepositoryError, RideRepository, UserRepository,
};
use crate::matching::scoring::SemanticScorer;
use crate::matching::service::MatchService;

pub(super) const HOST: &str = "host-1";
pub(super) const RIDE: &str = "ride-42";

pub(super) fn user_id(raw: &str) -> UserId {
    UserId(raw.to_string())
}

pub(super) fn ride() -> Ride {
    Ride {
        id: RideId(RIDE.to_string()),
        host_id: user_id(HOST),
        route: RideRoute {
            origin: RoutePoint {
                address: "Koramangala, Bengaluru".to_string(),
                lat: 12.9352,
                lng: 77.6245,
            },
            destination: RoutePoint {
                address: "Kempegowda International Airport".to_string(),
                lat: 13.1986,
                lng: 77.7066,
            },
        },
        departure_time: Utc
            .with_ymd_and_hms(2025, 11, 14, 6, 30, 0)
            .single()
            .expect("valid departure"),
        seats_offered: 3,
        passengers: vec![RidePassenger {
            user_id: user_id("rider-booked"),
            seats: 1,
            status: PassengerStatus::Pending,
        }],
        preferences: Preferences {
            gender: GenderPreference::Any,
            smoking: false,
            pets: false,
            music: true,
        },
        description: "Early airport run, light luggage only.".to_string(),
    }
}

/// Verified rider with middling stats who matches none of `ride()`'s flags.
pub(super) fn candidate(id: &str) -> CandidateUser {
    CandidateUser {
        id: user_id(id),
        name: format!("Rider {id}"),
        age: 31,
        gender: Gender::Female,
        rating: 0.0,
        total_rides: 0,
        phone_verified: true,
        email_verified: false,
        bio: String::new(),
        preferences: Preferences {
            gender: GenderPreference::Any,
            smoking: true,
            pets: true,
            music: false,
        },
    }
}

/// Candidate whose rule score against `ride()` is exactly `50 + 4 * rating`.
pub(super) fn rated_candidate(id: &str, rating: f64) -> CandidateUser {
    CandidateUser {
        rating,
        ..candidate(id)
    }
}

#[derive(Default)]
pub(super) struct MemoryRides {
    rides: HashMap<RideId, Ride>,
}

impl MemoryRides {
    pub(super) fn with(rides: Vec<Ride>) -> Self {
        Self {
            rides: rides.into_iter().map(|ride| (ride.id.clone(), ride)).collect(),
        }
    }
}

impl RideRepository for MemoryRides {
    fn find_ride_by_id(&self, id: &RideId) -> Result<Option<Ride>, RepositoryError> {
        Ok(self.rides.get(id).cloned())
    }
}

pub(super) struct UnavailableRides;

impl RideRepository for UnavailableRides {
    fn find_ride_by_id(&self, _id: &RideId) -> Result<Option<Ride>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// User store that returns its population verbatim and counts lookups.
#[derive(Default)]
pub(super) struct MemoryUsers {
    users: Vec<CandidateUser>,
    lookups: AtomicUsize,
    last_criteria: Mutex<Option<CandidateCriteria>>,
}

impl MemoryUsers {
    pub(super) fn with(users: Vec<CandidateUser>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub(super) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub(super) fn last_criteria(&self) -> Option<CandidateCriteria> {
        *self.last_criteria.lock().expect("criteria mutex poisoned")
    }
}

impl UserRepository for MemoryUsers {
    fn find_candidate_users(
        &self,
        criteria: &CandidateCriteria,
    ) -> Result<Vec<CandidateUser>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        *self.last_criteria.lock().expect("criteria mutex poisoned") = Some(*criteria);
        Ok(self.users.clone())
    }
}

pub(super) struct UnavailableUsers;

impl UserRepository for UnavailableUsers {
    fn find_candidate_users(
        &self,
        _criteria: &CandidateCriteria,
    ) -> Result<Vec<CandidateUser>, RepositoryError> {
        Err(RepositoryError::Unavailable("replica lag".to_string()))
    }
}

/// Deterministic embeddings: the ride descriptor maps to `[1, 0]`, candidates are looked up
/// by the name embedded in their descriptor, anything else gets `[0, 1]`.
pub(super) struct ScriptedEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    delay_for: Option<(String, Duration)>,
}

impl ScriptedEmbeddings {
    pub(super) fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            delay_for: None,
        }
    }

    pub(super) fn vector_for(mut self, name: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(name.to_string(), vector);
        self
    }

    /// Fail the `n`-th call (1-based) in issue order.
    pub(super) fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub(super) fn delaying(mut self, name: &str, delay: Duration) -> Self {
        self.delay_for = Some((name.to_string(), delay));
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for ScriptedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((name, delay)) = &self.delay_for {
            if text.starts_with(name.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }

        if self.fail_on_call == Some(call) {
            return Err(EmbeddingError::Transport("connection reset".to_string()));
        }

        if text.starts_with("Ride from") {
            return Ok(vec![1.0, 0.0]);
        }

        let vector = self
            .vectors
            .iter()
            .find(|(name, _)| text.starts_with(&format!("{name},")))
            .map(|(_, vector)| vector.clone())
            .unwrap_or_else(|| vec![0.0, 1.0]);
        Ok(vector)
    }
}

pub(super) fn scorer(client: ScriptedEmbeddings) -> (SemanticScorer, Arc<ScriptedEmbeddings>) {
    let client = Arc::new(client);
    let scorer = SemanticScorer::new(client.clone(), Duration::from_millis(500));
    (scorer, client)
}

pub(super) fn build_service(
    users: Vec<CandidateUser>,
    semantic: Option<SemanticScorer>,
) -> (MatchService<MemoryRides, MemoryUsers>, Arc<MemoryUsers>) {
    let users = Arc::new(MemoryUsers::with(users));
    let service = MatchService::new(
        Arc::new(MemoryRides::with(vec![ride()])),
        users.clone(),
        semantic,
    );
    (service, users)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
