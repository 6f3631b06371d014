use super::domain::{CandidateUser, Gender, Ride, RideId};

/// Ride store abstraction so the service can be exercised in isolation.
pub trait RideRepository: Send + Sync {
    fn find_ride_by_id(&self, id: &RideId) -> Result<Option<Ride>, RepositoryError>;
}

/// User store abstraction returning candidate snapshots in a stable enumeration order.
pub trait UserRepository: Send + Sync {
    fn find_candidate_users(
        &self,
        criteria: &CandidateCriteria,
    ) -> Result<Vec<CandidateUser>, RepositoryError>;
}

/// Filters a user store may push down. The eligibility filter re-applies them regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCriteria {
    pub phone_verified_only: bool,
    pub gender: Option<Gender>,
}

impl CandidateCriteria {
    pub fn for_ride(ride: &Ride) -> Self {
        Self {
            phone_verified_only: true,
            gender: ride.preferences.gender.required_gender(),
        }
    }

    pub fn admits(&self, candidate: &CandidateUser) -> bool {
        if self.phone_verified_only && !candidate.phone_verified {
            return false;
        }
        match self.gender {
            Some(gender) => candidate.gender == gender,
            None => true,
        }
    }
}

/// Error enumeration for collaborator store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}
