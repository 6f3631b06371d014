use super::super::domain::{CandidateUser, Ride};
use super::{ScoreComponent, ScoreFactor};

pub(crate) const BASE_SCORE: f64 = 50.0;
pub(crate) const MAX_SCORE: f64 = 100.0;
const RATING_MULTIPLIER: f64 = 4.0;
const RATING_CAP: f64 = 20.0;
const EXPERIENCE_PER_RIDE: f64 = 0.5;
const EXPERIENCE_CAP: f64 = 10.0;
const PREFERENCE_MATCH_BONUS: f64 = 5.0;
const EMAIL_VERIFIED_BONUS: f64 = 5.0;

/// Itemised contributions to a candidate's rule score, in evaluation order.
pub fn rule_components(candidate: &CandidateUser, ride: &Ride) -> Vec<ScoreComponent> {
    let mut components = vec![ScoreComponent {
        factor: ScoreFactor::Base,
        points: BASE_SCORE,
        notes: "baseline compatibility".to_string(),
    }];

    // f64::max maps NaN to the other operand, so corrupt ratings contribute nothing.
    let rating_bonus = (candidate.rating.max(0.0) * RATING_MULTIPLIER).min(RATING_CAP);
    components.push(ScoreComponent {
        factor: ScoreFactor::Rating,
        points: rating_bonus,
        notes: format!("average rating {:.1}", candidate.rating),
    });

    let experience_bonus =
        (f64::from(candidate.total_rides) * EXPERIENCE_PER_RIDE).min(EXPERIENCE_CAP);
    components.push(ScoreComponent {
        factor: ScoreFactor::Experience,
        points: experience_bonus,
        notes: format!("{} completed rides", candidate.total_rides),
    });

    let wanted = &ride.preferences;
    let offered = &candidate.preferences;
    for (factor, ride_flag, candidate_flag) in [
        (ScoreFactor::Smoking, wanted.smoking, offered.smoking),
        (ScoreFactor::Music, wanted.music, offered.music),
        (ScoreFactor::Pets, wanted.pets, offered.pets),
    ] {
        if ride_flag == candidate_flag {
            components.push(ScoreComponent {
                factor,
                points: PREFERENCE_MATCH_BONUS,
                notes: format!("{} preference matches ride", factor.label()),
            });
        }
    }

    if candidate.email_verified {
        components.push(ScoreComponent {
            factor: ScoreFactor::EmailVerified,
            points: EMAIL_VERIFIED_BONUS,
            notes: "email verified".to_string(),
        });
    }

    components
}

/// Deterministic 0-100 compatibility score from declared profile and preference data.
pub fn rule_score(candidate: &CandidateUser, ride: &Ride) -> u8 {
    let total: f64 = rule_components(candidate, ride)
        .iter()
        .map(|component| component.points)
        .sum();

    total.clamp(0.0, MAX_SCORE).round() as u8
}
