//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose Rust functionality
//! to Kotlin and Swift. All FFI functions are prefixed with `ffi_` to avoid
//! naming conflicts with the internal API.

use log::{debug, info, warn};

use crate::{
    GpsPoint, MatchConfig, MatchError, MatchResult, Trip, compute_matches, init_logging, polyline,
};

/// Error surfaced to Kotlin/Swift. Carries the Rust error's message only.
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum FfiError {
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Encode(String),
    #[error("{0}")]
    Config(String),
}

impl From<MatchError> for FfiError {
    fn from(error: MatchError) -> Self {
        match error {
            MatchError::Config(e) => FfiError::Config(e.to_string()),
            MatchError::Encode(e) => FfiError::Encode(e.to_string()),
            other => FfiError::Decode(other.to_string()),
        }
    }
}

// ============================================================================
// Geometry Codec
// ============================================================================

/// Encode a route as a compact polyline string.
///
/// Points come straight from the platform, so they are checked first.
#[uniffi::export]
pub fn ffi_encode_route(points: Vec<GpsPoint>) -> Result<String, FfiError> {
    init_logging();
    encode_checked(&points)
}

/// Decode a compact polyline string.
#[uniffi::export]
pub fn ffi_decode_route(encoded: String) -> Result<Vec<GpsPoint>, FfiError> {
    init_logging();
    polyline::decode(&encoded).map_err(|e| {
        warn!("[RideMatchRust] Failed to decode route: {}", e);
        FfiError::from(MatchError::from(e))
    })
}

// ============================================================================
// Matching
// ============================================================================

/// Get default configuration.
#[uniffi::export]
pub fn default_config() -> MatchConfig {
    init_logging();
    MatchConfig::default()
}

/// Score a trip against a list of counterparts.
#[uniffi::export]
pub fn ffi_compute_matches(
    candidate: Trip,
    others: Vec<Trip>,
    config: MatchConfig,
) -> Result<Vec<MatchResult>, FfiError> {
    init_logging();
    info!(
        "[RideMatchRust] compute_matches for {} against {} trips",
        candidate.id,
        others.len()
    );

    let start = std::time::Instant::now();
    let results = compute_matches(&candidate, &others, &config).map_err(MatchError::from)?;

    debug!(
        "[RideMatchRust] {} of {} matched in {:?}",
        results.iter().filter(|r| r.is_match).count(),
        results.len(),
        start.elapsed()
    );
    Ok(results)
}

/// Overlap score between two raw routes.
#[uniffi::export]
pub fn ffi_score_routes(a: Vec<GpsPoint>, b: Vec<GpsPoint>, config: MatchConfig) -> f64 {
    init_logging();
    crate::score_routes(&a, &b, &config)
}

/// Input for flat buffer processing (zero-copy from JS TypedArray)
#[derive(Debug, Clone, uniffi::Record)]
pub struct FlatRoute {
    /// Flat array of coordinates: [lat1, lng1, lat2, lng2, ...]
    pub coords: Vec<f64>,
}

/// Encode a flat coordinate buffer. A trailing odd value is ignored.
#[uniffi::export]
pub fn ffi_encode_flat(route: FlatRoute) -> Result<String, FfiError> {
    init_logging();
    let points: Vec<GpsPoint> = route
        .coords
        .chunks_exact(2)
        .map(|chunk| GpsPoint::new(chunk[0], chunk[1]))
        .collect();
    encode_checked(&points)
}

fn encode_checked(points: &[GpsPoint]) -> Result<String, FfiError> {
    polyline::try_encode(points).map_err(|e| {
        warn!("[RideMatchRust] Failed to encode route: {}", e);
        FfiError::from(MatchError::from(e))
    })
}
