//! Synthetic trip pools for stress testing and benchmarking.
//!
//! Generates riders and drivers along one shared road corridor, plus trips
//! that run the corridor backwards and trips far away from it, so every trip
//! has a known expected outcome.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use ridematch::synthetic::PoolScenario;
//!
//! let pool = PoolScenario::with_trip_count(20, 10).generate();
//! assert_eq!(pool.riders.len(), 20);
//! assert_eq!(pool.drivers.len(), 10);
//! ```

use std::collections::HashMap;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::METERS_PER_DEG_LAT;
use crate::{GpsPoint, Role, Trip};

// ============================================================================
// Types
// ============================================================================

/// How a generated trip relates to the shared corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripKind {
    /// Travels a stretch of the corridor in its forward direction.
    Corridor,
    /// Travels a stretch of the corridor backwards.
    Reversed,
    /// Travels a copy of the corridor shifted far away.
    Distant,
}

/// Scenario configuration for generating a trip pool.
#[derive(Debug, Clone)]
pub struct PoolScenario {
    /// Start of the shared corridor.
    pub origin: GpsPoint,
    /// Length of the shared corridor in meters.
    pub corridor_length_meters: f64,
    pub rider_count: usize,
    pub driver_count: usize,
    /// Fraction of trips that run the corridor backwards (0.0-1.0).
    pub reversed_fraction: f64,
    /// Fraction of trips placed far from the corridor (0.0-1.0).
    pub distant_fraction: f64,
    /// Shortest stretch of the corridor a trip covers, as a fraction.
    pub min_coverage: f64,
    /// Departures are spread uniformly over `base_time ± schedule_spread_secs`.
    pub base_time: i64,
    pub schedule_spread_secs: i64,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// A generated pool with its ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticPool {
    /// The shared corridor every `Corridor`/`Reversed` trip follows.
    pub corridor: Vec<GpsPoint>,
    pub riders: Vec<Trip>,
    pub drivers: Vec<Trip>,
    /// Kind of every generated trip, by ID.
    pub kinds: HashMap<String, TripKind>,
}

impl SyntheticPool {
    /// Riders followed by drivers.
    pub fn all_trips(&self) -> impl Iterator<Item = &Trip> {
        self.riders.iter().chain(self.drivers.iter())
    }

    pub fn kind(&self, trip_id: &str) -> Option<TripKind> {
        self.kinds.get(trip_id).copied()
    }

    /// Total GPS points across all trips.
    pub fn total_points(&self) -> usize {
        self.all_trips().map(|t| t.route.len()).sum()
    }
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Point spacing along the corridor (meters).
const POINT_SPACING: f64 = 25.0;

/// Latitude shift of distant trips, roughly 55 km.
const DISTANT_SHIFT_DEG: f64 = 0.5;

fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

// ============================================================================
// Generation
// ============================================================================

/// A gently winding road heading roughly north-east from `origin`.
fn generate_corridor(origin: GpsPoint, length_meters: f64, rng: &mut StdRng) -> Vec<GpsPoint> {
    let num_points = (length_meters / POINT_SPACING).ceil() as usize;
    let mut points = Vec::with_capacity(num_points + 1);
    let mut heading = PI / 4.0;
    let mut current = origin;
    points.push(current);

    for i in 0..num_points {
        // Bounded drift around the base heading keeps the road from looping.
        let drift = (i as f64 * 0.02).sin() * 0.2 + rng.gen_range(-0.05..0.05);
        heading = (PI / 4.0 + drift).clamp(PI / 8.0, 3.0 * PI / 8.0);

        current = GpsPoint::new(
            current.latitude + meters_to_deg_lat(POINT_SPACING * heading.sin()),
            current.longitude
                + meters_to_deg_lng(POINT_SPACING * heading.cos(), current.latitude),
        );
        points.push(current);
    }

    points
}

/// Add Gaussian GPS noise to a route.
fn add_gps_noise(points: &[GpsPoint], sigma_meters: f64, rng: &mut StdRng) -> Vec<GpsPoint> {
    if sigma_meters <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            // Box-Muller transform
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.r#gen();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();

            GpsPoint::new(
                p.latitude + meters_to_deg_lat(z0 * sigma_meters),
                p.longitude + meters_to_deg_lng(z1 * sigma_meters, p.latitude),
            )
        })
        .collect()
}

impl PoolScenario {
    /// Generate the pool described by this scenario.
    pub fn generate(&self) -> SyntheticPool {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let corridor = generate_corridor(self.origin, self.corridor_length_meters, &mut rng);

        let mut kinds = HashMap::new();
        let mut riders = Vec::with_capacity(self.rider_count);
        let mut drivers = Vec::with_capacity(self.driver_count);

        for (role, count, out) in [
            (Role::Rider, self.rider_count, &mut riders),
            (Role::Driver, self.driver_count, &mut drivers),
        ] {
            for i in 0..count {
                let id = format!("{}-{}", role, i);
                let kind = self.pick_kind(&mut rng);
                let trip = self.generate_trip(&id, role, kind, &corridor, &mut rng);
                kinds.insert(id, kind);
                out.push(trip);
            }
        }

        SyntheticPool {
            corridor,
            riders,
            drivers,
            kinds,
        }
    }

    fn pick_kind(&self, rng: &mut StdRng) -> TripKind {
        let roll: f64 = rng.r#gen();
        if roll < self.distant_fraction {
            TripKind::Distant
        } else if roll < self.distant_fraction + self.reversed_fraction {
            TripKind::Reversed
        } else {
            TripKind::Corridor
        }
    }

    fn generate_trip(
        &self,
        id: &str,
        role: Role,
        kind: TripKind,
        corridor: &[GpsPoint],
        rng: &mut StdRng,
    ) -> Trip {
        // Each trip covers at least `min_coverage` of the corridor.
        let last = corridor.len() - 1;
        let span = ((last as f64) * self.min_coverage.clamp(0.0, 1.0)).ceil() as usize;
        let span = span.clamp(1, last.max(1));
        let start = if last > span {
            rng.gen_range(0..=last - span)
        } else {
            0
        };
        let end = rng.gen_range(start + span..=last.max(start + span));

        let mut route = add_gps_noise(
            &corridor[start..=end.min(last)],
            self.gps_noise_sigma_meters,
            rng,
        );

        match kind {
            TripKind::Corridor => {}
            TripKind::Reversed => route.reverse(),
            TripKind::Distant => {
                for p in &mut route {
                    p.latitude += DISTANT_SHIFT_DEG;
                }
            }
        }

        let scheduled_at = if self.schedule_spread_secs > 0 {
            self.base_time + rng.gen_range(-self.schedule_spread_secs..=self.schedule_spread_secs)
        } else {
            self.base_time
        };

        Trip::new(id, role, route, scheduled_at)
    }
}

// ============================================================================
// Presets
// ============================================================================

impl PoolScenario {
    /// A small neighbourhood pool with clean GPS.
    pub fn small() -> Self {
        Self {
            origin: GpsPoint::new(47.37, 8.55),
            corridor_length_meters: 5_000.0,
            rider_count: 20,
            driver_count: 10,
            reversed_fraction: 0.2,
            distant_fraction: 0.2,
            min_coverage: 0.6,
            base_time: 1_700_000_000,
            schedule_spread_secs: 900,
            gps_noise_sigma_meters: 0.0,
            seed: 42,
        }
    }

    /// A city-scale pool with noisy GPS.
    pub fn city_scale() -> Self {
        Self {
            corridor_length_meters: 15_000.0,
            rider_count: 1_000,
            driver_count: 500,
            schedule_spread_secs: 3_600,
            gps_noise_sigma_meters: 5.0,
            ..Self::small()
        }
    }

    /// The small preset with custom counts.
    pub fn with_trip_count(riders: usize, drivers: usize) -> Self {
        Self {
            rider_count: riders,
            driver_count: drivers,
            ..Self::small()
        }
    }
}
