use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;

use super::super::domain::{CandidateUser, Ride, UserId};
use super::super::embedding::{EmbeddingClient, EmbeddingError};
use super::rules::MAX_SCORE;

pub const MISSING_BIO_PLACEHOLDER: &str = "No bio provided";

/// Semantic score per candidate, keyed by identity rather than call completion order.
pub type SemanticScores = HashMap<UserId, u8>;

/// Optional embedding-backed scorer. Any failure fails the whole pass.
#[derive(Clone)]
pub struct SemanticScorer {
    client: Arc<dyn EmbeddingClient>,
    call_timeout: Duration,
}

impl SemanticScorer {
    pub fn new(client: Arc<dyn EmbeddingClient>, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Scores every candidate against the ride, or fails without any partial result.
    ///
    /// The ride embedding and one embedding per candidate are requested concurrently; the
    /// first failure or timeout drops the outstanding calls.
    pub async fn score(
        &self,
        ride: &Ride,
        candidates: &[CandidateUser],
    ) -> Result<SemanticScores, SemanticError> {
        if candidates.is_empty() {
            return Ok(SemanticScores::new());
        }

        let ride_text = ride_descriptor(ride);
        let candidate_texts: Vec<(&UserId, String)> = candidates
            .iter()
            .map(|candidate| (&candidate.id, candidate_descriptor(candidate)))
            .collect();

        let ride_call = self.embed_bounded(EmbeddingSubject::Ride, &ride_text);
        let candidate_calls = try_join_all(candidate_texts.iter().map(|(id, text)| {
            self.embed_bounded(EmbeddingSubject::Candidate((*id).clone()), text)
        }));

        let (ride_vector, candidate_vectors) = futures::try_join!(ride_call, candidate_calls)?;

        let mut scores = SemanticScores::with_capacity(candidates.len());
        for ((id, _), vector) in candidate_texts.iter().zip(candidate_vectors) {
            if vector.len() != ride_vector.len() {
                return Err(SemanticError::DimensionMismatch {
                    candidate: (*id).clone(),
                    expected: ride_vector.len(),
                    actual: vector.len(),
                });
            }
            let similarity = cosine_similarity(&ride_vector, &vector);
            scores.insert((*id).clone(), similarity_to_score(similarity));
        }

        Ok(scores)
    }

    async fn embed_bounded(
        &self,
        subject: EmbeddingSubject,
        text: &str,
    ) -> Result<Vec<f32>, SemanticError> {
        match tokio::time::timeout(self.call_timeout, self.client.embed(text)).await {
            Ok(Ok(vector)) if vector.is_empty() => Err(SemanticError::Embedding {
                subject,
                source: EmbeddingError::MalformedResponse("empty embedding vector".to_string()),
            }),
            Ok(Ok(vector)) if vector.iter().any(|component| !component.is_finite()) => {
                Err(SemanticError::Embedding {
                    subject,
                    source: EmbeddingError::MalformedResponse(
                        "embedding vector has non-finite components".to_string(),
                    ),
                })
            }
            Ok(Ok(vector)) => Ok(vector),
            Ok(Err(source)) => Err(SemanticError::Embedding { subject, source }),
            Err(_) => Err(SemanticError::Timeout {
                subject,
                after: self.call_timeout,
            }),
        }
    }
}

/// Which descriptor an embedding call was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingSubject {
    Ride,
    Candidate(UserId),
}

impl std::fmt::Display for EmbeddingSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingSubject::Ride => f.write_str("ride"),
            EmbeddingSubject::Candidate(id) => write!(f, "candidate {id}"),
        }
    }
}

/// Typed failure of a semantic pass; the caller falls back to rule-only ranking.
#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("embedding for {subject} failed: {source}")]
    Embedding {
        subject: EmbeddingSubject,
        #[source]
        source: EmbeddingError,
    },
    #[error("embedding for {subject} timed out after {after:?}")]
    Timeout {
        subject: EmbeddingSubject,
        after: Duration,
    },
    #[error("embedding for candidate {candidate} has {actual} dimensions, ride has {expected}")]
    DimensionMismatch {
        candidate: UserId,
        expected: usize,
        actual: usize,
    },
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn ride_descriptor(ride: &Ride) -> String {
    let preferences = &ride.preferences;
    let mut text = format!(
        "Ride from {} to {} departing {}. Preferred passenger gender: {}. Smoking allowed: {}. Pets allowed: {}. Music: {}.",
        ride.route.origin.address,
        ride.route.destination.address,
        ride.departure_time.format("%A %-d %B %Y at %H:%M UTC"),
        preferences.gender.label(),
        yes_no(preferences.smoking),
        yes_no(preferences.pets),
        yes_no(preferences.music),
    );

    let description = ride.description.trim();
    if !description.is_empty() {
        text.push(' ');
        text.push_str(description);
    }
    text
}

pub fn candidate_descriptor(candidate: &CandidateUser) -> String {
    let bio = match candidate.bio.trim() {
        "" => MISSING_BIO_PLACEHOLDER,
        bio => bio,
    };
    let preferences = &candidate.preferences;

    format!(
        "{}, {} years old, {}. Bio: {}. Smoking: {}. Pets: {}. Music: {}.",
        candidate.name,
        candidate.age,
        candidate.gender.label(),
        bio,
        yes_no(preferences.smoking),
        yes_no(preferences.pets),
        yes_no(preferences.music),
    )
}

/// `dot(a, b) / (|a| * |b|)`, with a zero-norm vector on either side scoring 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

/// Scales a similarity in `[-1, 1]` to an integer score, floored at 0.
pub fn similarity_to_score(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, MAX_SCORE) as u8
}
