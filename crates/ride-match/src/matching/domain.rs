use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_RIDE_ID_LEN: usize = 64;

/// Identifier wrapper for offered rides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(pub String);

impl RideId {
    /// Validates a caller-supplied ride identifier before any store is touched.
    pub fn parse(raw: &str) -> Result<Self, RideIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RideIdError::Empty);
        }
        if trimmed.len() > MAX_RIDE_ID_LEN {
            return Err(RideIdError::TooLong(trimmed.len()));
        }
        if let Some(invalid) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(RideIdError::InvalidCharacter(invalid));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RideIdError {
    #[error("rideId must not be empty")]
    Empty,
    #[error("rideId must be at most 64 characters, got {0}")]
    TooLong(usize),
    #[error("rideId contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Identifier wrapper for users (hosts, passengers, and candidates alike).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRoute {
    pub origin: RoutePoint,
    pub destination: RoutePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

/// Seat booking held on a ride; any status still excludes the user from matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RidePassenger {
    pub user_id: UserId,
    pub seats: u8,
    pub status: PassengerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    #[default]
    Any,
    Male,
    Female,
}

impl GenderPreference {
    /// The single gender admitted by this preference, or `None` when anyone is welcome.
    pub const fn required_gender(self) -> Option<Gender> {
        match self {
            GenderPreference::Any => None,
            GenderPreference::Male => Some(Gender::Male),
            GenderPreference::Female => Some(Gender::Female),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            GenderPreference::Any => "any",
            GenderPreference::Male => "male",
            GenderPreference::Female => "female",
        }
    }
}

/// Travel preferences shared by rides and riders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub gender: GenderPreference,
    pub smoking: bool,
    pub pets: bool,
    pub music: bool,
}

/// Ride snapshot as loaded from the ride store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub host_id: UserId,
    pub route: RideRoute,
    pub departure_time: DateTime<Utc>,
    pub seats_offered: u8,
    #[serde(default)]
    pub passengers: Vec<RidePassenger>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub description: String,
}

impl Ride {
    pub fn has_passenger(&self, user_id: &UserId) -> bool {
        self.passengers
            .iter()
            .any(|passenger| &passenger.user_id == user_id)
    }
}

/// Read-only user snapshot considered for a ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUser {
    pub id: UserId,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    /// Average rating on a 0-5 scale.
    pub rating: f64,
    pub total_rides: u32,
    pub phone_verified: bool,
    pub email_verified: bool,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub preferences: Preferences,
}

impl CandidateUser {
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            age: self.age,
            gender: self.gender,
            rating: self.rating,
            total_rides: self.total_rides,
            bio: self.bio.clone(),
            preferences: self.preferences,
        }
    }
}

/// Candidate fields safe to hand back to the ride host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: UserId,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub rating: f64,
    pub total_rides: u32,
    pub bio: String,
    pub preferences: Preferences,
}
