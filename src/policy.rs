//! Match policy: turns a corridor overlap into a verdict.
//!
//! A pair matches when all of the following hold:
//! 1. one trip is a rider and the other a driver
//! 2. both trips are active
//! 3. overlap ratio >= `min_overlap`
//! 4. direction cosine >= `min_direction_cosine`
//! 5. departures differ by at most `time_window_secs`
//!
//! A failed pair still carries its overlap so the caller can show the
//! closest near-misses.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::corridor::{CorridorOverlap, corridor_overlap};
use crate::error::ConfigError;
use crate::{MatchConfig, MatchResult, Rejection, Trip};

/// Judge one scored pair against `config`.
///
/// Pure; assumes `config` has already been validated.
pub fn evaluate(
    trip: &Trip,
    other: &Trip,
    overlap: &CorridorOverlap,
    config: &MatchConfig,
) -> MatchResult {
    let direction_compatible =
        !overlap.degenerate && overlap.direction_cosine >= config.min_direction_cosine;

    let rejection = if overlap.degenerate {
        Some(Rejection::DegenerateRoute)
    } else if trip.role == other.role {
        Some(Rejection::SameRole)
    } else if !trip.is_active() || !other.is_active() {
        Some(Rejection::InactiveTrip)
    } else if overlap.ratio < config.min_overlap {
        Some(Rejection::InsufficientOverlap)
    } else if !direction_compatible {
        Some(Rejection::OppositeDirection)
    } else if trip.scheduled_at.abs_diff(other.scheduled_at)
        > config.time_window_secs.unsigned_abs()
    {
        Some(Rejection::OutsideTimeWindow)
    } else {
        None
    };

    MatchResult {
        trip_id: trip.id.clone(),
        other_trip_id: other.id.clone(),
        overlap: overlap.ratio,
        direction_cosine: overlap.direction_cosine,
        direction_compatible,
        is_match: rejection.is_none(),
        match_percentage: (overlap.ratio * 100.0).round() as u32,
        rejection,
    }
}

/// Score and judge a single pair.
pub fn score_pair(trip: &Trip, other: &Trip, config: &MatchConfig) -> MatchResult {
    let overlap = corridor_overlap(
        &trip.route,
        &other.route,
        config.corridor_width_meters,
        config.sample_spacing_meters,
    );
    evaluate(trip, other, &overlap, config)
}

/// Score `candidate` against every trip in `others`.
///
/// Returns one result per counterpart, matches and near-misses alike, in the
/// order of `others`. A counterpart sharing the candidate's id is skipped.
/// The config is validated before any scoring happens.
pub fn compute_matches(
    candidate: &Trip,
    others: &[Trip],
    config: &MatchConfig,
) -> Result<Vec<MatchResult>, ConfigError> {
    config.validate()?;
    Ok(score_all(candidate, others.iter(), config))
}

/// Score against an iterator of counterparts without re-validating `config`.
pub(crate) fn score_all<'a, I>(
    candidate: &Trip,
    others: I,
    config: &MatchConfig,
) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a Trip>,
{
    let others: Vec<&Trip> = others
        .into_iter()
        .filter(|other| other.id != candidate.id)
        .collect();

    #[cfg(feature = "parallel")]
    {
        others
            .par_iter()
            .map(|other| score_pair(candidate, other, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        others
            .iter()
            .map(|other| score_pair(candidate, other, config))
            .collect()
    }
}
