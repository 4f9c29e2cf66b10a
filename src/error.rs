//! Unified error handling.
//!
//! Every fallible operation in the crate returns one of the typed errors below.
//! Nothing in the matching core logs-and-swallows a failure: errors travel back
//! to the caller, who decides what to show or retry.

use thiserror::Error;

/// Malformed compact-route (encoded polyline) string.
///
/// Positions are byte offsets into the encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A character outside the polyline alphabet, or one that would extend a
    /// value past 64 bits.
    #[error("invalid polyline character {character:?} at byte {position}")]
    InvalidCharacter { position: usize, character: char },

    /// The stream ended while a value still had its continuation bit set.
    #[error("polyline truncated at byte {position}")]
    Truncated { position: usize },

    /// A decoded coordinate fell outside latitude/longitude range.
    #[error("polyline coordinate at byte {position} is out of range")]
    OutOfRange { position: usize },

    /// A latitude was decoded without its paired longitude.
    #[error("polyline ends after a latitude at byte {position} with no longitude")]
    MissingLongitude { position: usize },

    #[error("malformed polyline: {0}")]
    Malformed(String),
}

/// A route that cannot be written as a compact polyline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// Non-finite or out-of-range coordinate.
    #[error("point {index} ({latitude}, {longitude}) is not a valid coordinate")]
    InvalidPoint {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    #[error("polyline encoding failed: {0}")]
    Rejected(String),
}

/// A route with too few points for a strict overlap computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route '{route_id}' has {point_count} points, need at least {minimum_required}")]
pub struct InvalidRouteError {
    pub route_id: String,
    pub point_count: usize,
    pub minimum_required: usize,
}

/// Invalid [`MatchConfig`](crate::MatchConfig), raised before any scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("corridor width must be a finite, non-negative number of meters (got {0})")]
    InvalidCorridorWidth(f64),

    #[error("minimum overlap must lie in [0, 1] (got {0})")]
    InvalidMinOverlap(f64),

    #[error("minimum direction cosine must lie in [-1, 1] (got {0})")]
    InvalidDirectionCosine(f64),

    #[error("time window must be positive (got {0}s)")]
    InvalidTimeWindow(i64),

    #[error("sample spacing must be a finite, positive number of meters (got {0})")]
    InvalidSampleSpacing(f64),

    #[error("failed to parse match config: {0}")]
    Parse(String),
}

/// Failure reported by a routing provider. Never retried by the engine.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("routing provider returned no route")]
    EmptyRoute,

    #[error("routing provider response could not be understood: {0}")]
    InvalidResponse(String),

    #[error("routing provider API key is not configured")]
    MissingApiKey,

    #[cfg(feature = "http")]
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure reported by a trip store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("trip store unavailable: {0}")]
    Unavailable(String),

    #[error("trip store subscription closed")]
    Closed,
}

/// Umbrella error for callers that mix engine operations.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    InvalidRoute(#[from] InvalidRouteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias using [`MatchError`].
pub type Result<T> = std::result::Result<T, MatchError>;
