//! # Ride Match
//!
//! Route matching engine for pairing riders with drivers whose trips share a
//! road corridor, travel the same way and leave at about the same time.
//!
//! This library provides:
//! - Compact polyline encoding/decoding for route geometry
//! - Corridor overlap between two routes (resampled point-to-segment coverage)
//! - A pure match policy combining overlap, direction, timing and roles
//! - A live matcher that keeps the active trip pool and re-scores on change
//!
//! ## Features
//!
//! - **`parallel`** - Score candidate pairs in parallel with rayon (default)
//! - **`http`** - OpenRouteService routing provider
//! - **`ffi`** - FFI bindings for mobile platforms (iOS/Android)
//! - **`synthetic`** - Synthetic trip pools for benchmarks and stress tests
//! - **`cli`** - The `ridematch-cli` debugging tool
//!
//! ## Quick Start
//!
//! ```rust
//! use ridematch::{GpsPoint, MatchConfig, Role, Trip, compute_matches};
//!
//! let route: Vec<GpsPoint> = (0..=20)
//!     .map(|i| GpsPoint::new(51.50 + i as f64 * 0.001, -0.1278))
//!     .collect();
//!
//! let rider = Trip::new("rider-1", Role::Rider, route.clone(), 1_700_000_000);
//! let driver = Trip::new("driver-1", Role::Driver, route, 1_700_000_600);
//!
//! let results = compute_matches(&rider, &[driver], &MatchConfig::default()).unwrap();
//! assert!(results[0].is_match);
//! assert_eq!(results[0].match_percentage, 100);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{
    ConfigError, DecodeError, EncodeError, InvalidRouteError, MatchError, Result, RoutingError,
    StoreError,
};

// Geographic utilities (distance, projection, bounds)
pub mod geo_utils;

// Compact route encoding
pub mod polyline;

// Corridor overlap between two routes
pub mod corridor;
pub use corridor::{CorridorOverlap, corridor_overlap, try_corridor_overlap};

// Match policy
pub mod policy;
pub use policy::{compute_matches, evaluate};

// Live matching over the active trip pool
pub mod engine;
pub use engine::{
    ChannelListener, EngineStats, LiveMatcher, MatchEvent, MatchListener, MatchUpdate,
    NoopListener, RoleUpdateReport,
};

// Routing provider seam
pub mod routing;
pub use routing::{RouteResponse, RoutingProvider, plan_trip};

// Trip store seam
pub mod store;
pub use store::{InMemoryTripStore, TripSnapshot, TripStore};

// Synthetic trip pools for benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RideMatchRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate in degrees.
///
/// # Example
/// ```
/// use ridematch::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// An ordered route geometry. A usable route has at least two distinct points.
pub type Route = Vec<GpsPoint>;

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Which side of a shared ride a trip is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Role {
    Rider,
    Driver,
}

impl Role {
    /// The role a match must pair this one with.
    pub fn opposite(self) -> Role {
        match self {
            Role::Rider => Role::Driver,
            Role::Driver => Role::Rider,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a trip. Closed trips (cancelled or completed) are never
/// compared again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum TripStatus {
    #[default]
    Active,
    Closed,
}

/// A confirmed trip with its decoded route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Trip {
    pub id: String,
    pub role: Role,
    pub origin: GpsPoint,
    pub destination: GpsPoint,
    pub route: Vec<GpsPoint>,
    /// Scheduled departure, Unix seconds.
    pub scheduled_at: i64,
    pub status: TripStatus,
}

impl Trip {
    /// Active trip whose origin and destination are the route's endpoints.
    ///
    /// An empty route falls back to `(0, 0)` endpoints; such a trip never
    /// matches anything.
    pub fn new(id: impl Into<String>, role: Role, route: Vec<GpsPoint>, scheduled_at: i64) -> Self {
        let origin = route.first().copied().unwrap_or(GpsPoint::new(0.0, 0.0));
        let destination = route.last().copied().unwrap_or(origin);
        Self {
            id: id.into(),
            role,
            origin,
            destination,
            route,
            scheduled_at,
            status: TripStatus::Active,
        }
    }

    /// Decode a stored trip record.
    pub fn from_record(record: &TripRecord) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            id: record.id.clone(),
            role: record.role,
            origin: record.origin,
            destination: record.destination,
            route: polyline::decode(&record.encoded_polyline)?,
            scheduled_at: record.scheduled_at,
            status: record.status,
        })
    }

    /// Encode this trip into its stored form.
    pub fn to_record(&self) -> TripRecord {
        TripRecord {
            id: self.id.clone(),
            role: self.role,
            origin: self.origin,
            destination: self.destination,
            encoded_polyline: polyline::encode(&self.route),
            scheduled_at: self.scheduled_at,
            status: self.status,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TripStatus::Active
    }

    /// Bounding box of the route, if it has any points.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.route)
    }
}

/// A trip as the trip store holds it: the route travels as an encoded polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: String,
    pub role: Role,
    pub origin: GpsPoint,
    pub destination: GpsPoint,
    pub encoded_polyline: String,
    /// Scheduled departure, Unix seconds.
    pub scheduled_at: i64,
    #[serde(default)]
    pub status: TripStatus,
}

/// Why a candidate pair was not a match. Only the first failing check is
/// reported, in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Rejection {
    /// One of the routes has fewer than two points or zero length.
    DegenerateRoute,
    /// Both trips are riders, or both are drivers.
    SameRole,
    /// At least one trip is closed.
    InactiveTrip,
    /// The routes do not share enough corridor.
    InsufficientOverlap,
    /// The routes head in incompatible directions.
    OppositeDirection,
    /// The departures are too far apart.
    OutsideTimeWindow,
}

/// Outcome of scoring one candidate pair.
///
/// Always derivable from the two trips and the config; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MatchResult {
    /// The trip being matched
    pub trip_id: String,
    /// The counterpart it was scored against
    pub other_trip_id: String,
    /// Final overlap ratio in [0, 1] (minimum of both directions)
    pub overlap: f64,
    /// Cosine between the two net travel directions, in [-1, 1]
    pub direction_cosine: f64,
    /// Whether the direction cosine clears the configured minimum
    pub direction_compatible: bool,
    pub is_match: bool,
    /// round(overlap * 100), for display
    pub match_percentage: u32,
    /// First failed check when `is_match` is false
    pub rejection: Option<Rejection>,
}

impl MatchResult {
    /// Whether this result concerns the given trip on either side.
    pub fn involves(&self, trip_id: &str) -> bool {
        self.trip_id == trip_id || self.other_trip_id == trip_id
    }
}

/// Configuration for route matching.
///
/// Every threshold the engine uses comes from here. Call
/// [`MatchConfig::validate`] (or let the engine do it) before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MatchConfig {
    /// Corridor half-width in meters: a sample point within this distance of
    /// the other route counts as covered.
    /// Default: 300.0
    pub corridor_width_meters: f64,

    /// Minimum final overlap ratio for a match.
    /// Default: 0.5
    pub min_overlap: f64,

    /// Maximum difference between scheduled departures, in seconds.
    /// Default: 1800 (30 minutes)
    pub time_window_secs: i64,

    /// Minimum cosine between net travel directions.
    /// Default: 0.5 (within 60 degrees)
    pub min_direction_cosine: f64,

    /// Arc-length step for resampling routes before the coverage test.
    /// Default: 50.0 meters
    pub sample_spacing_meters: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            corridor_width_meters: 300.0,
            min_overlap: 0.5,
            time_window_secs: 1800,
            min_direction_cosine: 0.5,
            sample_spacing_meters: 50.0,
        }
    }
}

impl MatchConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let width = self.corridor_width_meters;
        if !width.is_finite() || width < 0.0 {
            return Err(ConfigError::InvalidCorridorWidth(width));
        }
        if !(0.0..=1.0).contains(&self.min_overlap) {
            return Err(ConfigError::InvalidMinOverlap(self.min_overlap));
        }
        if !(-1.0..=1.0).contains(&self.min_direction_cosine) {
            return Err(ConfigError::InvalidDirectionCosine(self.min_direction_cosine));
        }
        if self.time_window_secs <= 0 {
            return Err(ConfigError::InvalidTimeWindow(self.time_window_secs));
        }
        let spacing = self.sample_spacing_meters;
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ConfigError::InvalidSampleSpacing(spacing));
        }
        Ok(())
    }

    /// Parse a JSON config (camelCase keys, missing keys take defaults) and
    /// validate it.
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        let config: MatchConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Engine Surface
// ============================================================================

/// Encode a route as a compact polyline string.
pub fn encode_route(points: &[GpsPoint]) -> String {
    polyline::encode(points)
}

/// Decode a compact polyline string into a route.
pub fn decode_route(encoded: &str) -> std::result::Result<Route, DecodeError> {
    polyline::decode(encoded)
}

/// Symmetric overlap score between two routes under `config`.
pub fn score_routes(a: &[GpsPoint], b: &[GpsPoint], config: &MatchConfig) -> f64 {
    corridor_overlap(
        a,
        b,
        config.corridor_width_meters,
        config.sample_spacing_meters,
    )
    .ratio
}
