use super::domain::{CandidateUser, Ride};
use super::repository::CandidateCriteria;

/// Reduces the candidate population to riders who may legally be matched to `ride`.
///
/// The host, anyone already on the passenger list (whatever their status), and users
/// without a verified phone are always dropped; a non-`any` gender preference keeps only
/// candidates of that gender. Enumeration order of the input is preserved, since ranking
/// uses it to break ties.
pub fn eligible_candidates(ride: &Ride, population: Vec<CandidateUser>) -> Vec<CandidateUser> {
    let criteria = CandidateCriteria::for_ride(ride);

    population
        .into_iter()
        .filter(|candidate| candidate.id != ride.host_id)
        .filter(|candidate| !ride.has_passenger(&candidate.id))
        .filter(|candidate| criteria.admits(candidate))
        .collect()
}
