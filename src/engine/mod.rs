//! # Live Matching Engine
//!
//! Keeps the pool of active trips and re-scores matches as trips appear,
//! change or disappear.
//!
//! ## Architecture
//!
//! The engine is composed of focused modules:
//! - `RolePartition` - Snapshot-published registry of one role's trips
//! - `SpatialIndex` - R-tree prefilter over trip bounding boxes
//! - `MatchListener` - Delivery of match events to subscribers
//!
//! Scoring never blocks on I/O: routes are fetched and decoded before a trip
//! reaches the engine. Registrations for different roles proceed in parallel;
//! registrations for the same role serialize on that role's writer lock.

pub mod listener;
pub mod spatial_index;
pub mod trip_registry;

pub use listener::{ChannelListener, MatchEvent, MatchListener, MatchUpdate, NoopListener};
pub use spatial_index::{SpatialIndex, TripBounds};
pub use trip_registry::{PartitionSnapshot, ReconcileCounts, RolePartition};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::error::{ConfigError, StoreError};
use crate::policy::score_all;
use crate::store::{TripSnapshot, TripStore};
use crate::{MatchConfig, MatchResult, Role, Trip};

/// Live matcher over the active trip pool.
///
/// All methods take `&self`; share the matcher between threads with an `Arc`.
pub struct LiveMatcher {
    config: ArcSwap<MatchConfig>,
    riders: RolePartition,
    drivers: RolePartition,
    /// Serializes register/retire per trip id so a role change cannot leave
    /// the id in both partitions.
    id_locks: [Mutex<()>; ID_LOCK_STRIPES],
    listener: Arc<dyn MatchListener>,
}

const ID_LOCK_STRIPES: usize = 16;

impl LiveMatcher {
    /// Create a matcher that emits no events.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        Self::with_listener(config, Arc::new(NoopListener))
    }

    /// Create a matcher that reports to `listener`.
    pub fn with_listener(
        config: MatchConfig,
        listener: Arc<dyn MatchListener>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: ArcSwap::from_pointee(config),
            riders: RolePartition::new(Role::Rider),
            drivers: RolePartition::new(Role::Driver),
            id_locks: std::array::from_fn(|_| Mutex::new(())),
            listener,
        })
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current match configuration.
    pub fn config(&self) -> Arc<MatchConfig> {
        self.config.load_full()
    }

    /// Publish a new configuration. Scans already running finish with the
    /// config they started with.
    pub fn set_config(&self, config: MatchConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config.store(Arc::new(config));
        Ok(())
    }

    // ========================================================================
    // Trip Management
    // ========================================================================

    /// Insert or update a trip and score it against every active trip of the
    /// opposite role.
    ///
    /// Returns only the pairs that match; each is also sent to the listener.
    /// Registering a closed trip retires it.
    pub fn register(&self, trip: Trip) -> Vec<MatchResult> {
        if !trip.is_active() {
            self.retire(&trip.id);
            return Vec::new();
        }

        let config = self.config.load_full();
        let trip = Arc::new(trip);
        let opposite = self.partition(trip.role.opposite());

        let previous = {
            let _id_guard = self.lock_id(&trip.id);
            // A trip that switched roles must leave its old partition first.
            if opposite.remove(&trip.id).is_some() {
                debug!(
                    "[RideMatch] Trip {} moved from {} to {}",
                    trip.id,
                    trip.role.opposite(),
                    trip.role
                );
            }
            self.partition(trip.role).upsert(Arc::clone(&trip))
        };

        let counterparts = opposite.snapshot();
        let matches: Vec<MatchResult> = scan(&trip, &counterparts, &config)
            .into_iter()
            .filter(|m| m.is_match)
            .collect();

        debug!(
            "[RideMatch] {} {} {}: {} of {} {}s matched",
            if previous.is_some() { "Updated" } else { "Registered" },
            trip.role,
            trip.id,
            matches.len(),
            counterparts.len(),
            trip.role.opposite()
        );

        for result in &matches {
            self.listener.on_event(&MatchEvent::Paired(result.clone()));
        }
        matches
    }

    /// Remove a trip from future comparisons.
    ///
    /// Matches already handed out stay valid. Idempotent: returns whether the
    /// trip was present.
    pub fn retire(&self, trip_id: &str) -> bool {
        let _id_guard = self.lock_id(trip_id);
        let removed =
            self.riders.remove(trip_id).is_some() | self.drivers.remove(trip_id).is_some();
        if removed {
            debug!("[RideMatch] Retired trip {}", trip_id);
        }
        removed
    }

    /// Reconcile one role's trips with an authoritative snapshot from the trip
    /// store, then refresh the match set of every trip of the opposite role.
    ///
    /// Closed trips and trips filed under another role are left out. A trip
    /// whose role changed is dropped from the old partition by that role's
    /// next snapshot.
    pub fn on_role_update(&self, role: Role, snapshot: Vec<Trip>) -> RoleUpdateReport {
        let config = self.config.load_full();

        let mut misfiled = 0usize;
        let active: Vec<Trip> = snapshot
            .into_iter()
            .filter(|trip| {
                if trip.role != role {
                    misfiled += 1;
                    warn!(
                        "[RideMatch] Ignoring {} trip {} in {} snapshot",
                        trip.role, trip.id, role
                    );
                    return false;
                }
                trip.is_active()
            })
            .collect();

        let counts = self.partition(role).replace(active);
        info!(
            "[RideMatch] {} snapshot: +{} ~{} -{} ({} unchanged, {} misfiled)",
            role, counts.added, counts.updated, counts.removed, counts.unchanged, misfiled
        );

        let pool = self.partition(role).snapshot();
        let interested = self.partition(role.opposite()).snapshot();

        let refreshed: Vec<MatchUpdate> = interested
            .trips()
            .map(|trip| MatchUpdate {
                trip_id: trip.id.clone(),
                matches: scan(trip, &pool, &config)
                    .into_iter()
                    .filter(|m| m.is_match)
                    .collect(),
            })
            .collect();

        for update in &refreshed {
            self.listener.on_event(&MatchEvent::Refreshed(update.clone()));
        }

        RoleUpdateReport {
            role,
            counts,
            rejected: Vec::new(),
            refreshed,
        }
    }

    /// Decode a store snapshot and reconcile it.
    ///
    /// Records whose polyline does not decode are reported to the listener
    /// and listed in the report instead of aborting the update.
    pub fn apply_snapshot(&self, snapshot: TripSnapshot) -> RoleUpdateReport {
        let mut rejected = Vec::new();
        let mut trips = Vec::with_capacity(snapshot.records.len());

        for record in &snapshot.records {
            match Trip::from_record(record) {
                Ok(trip) => trips.push(trip),
                Err(error) => {
                    warn!(
                        "[RideMatch] Trip {} has an undecodable route: {}",
                        record.id, error
                    );
                    self.listener.on_event(&MatchEvent::Rejected {
                        trip_id: record.id.clone(),
                        error,
                    });
                    rejected.push(record.id.clone());
                }
            }
        }

        let mut report = self.on_role_update(snapshot.role, trips);
        report.rejected = rejected;
        report
    }

    /// Follow a trip store subscription until the store hangs up.
    ///
    /// Blocks the calling thread; run one per role on its own thread.
    pub fn follow<S>(&self, store: &S, role: Role) -> Result<(), StoreError>
    where
        S: TripStore + ?Sized,
    {
        let updates = store.subscribe(role)?;
        info!("[RideMatch] Following {} trips", role);

        for snapshot in updates {
            if snapshot.role != role {
                warn!(
                    "[RideMatch] {} subscription delivered a {} snapshot",
                    role, snapshot.role
                );
            }
            self.apply_snapshot(snapshot);
        }

        info!("[RideMatch] {} subscription ended", role);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Recompute the current matches of a registered trip.
    pub fn matches_for(&self, trip_id: &str) -> Option<Vec<MatchResult>> {
        let trip = self.get_trip(trip_id)?;
        let config = self.config.load_full();
        let pool = self.partition(trip.role.opposite()).snapshot();
        Some(
            scan(&trip, &pool, &config)
                .into_iter()
                .filter(|m| m.is_match)
                .collect(),
        )
    }

    /// Get a registered trip by ID.
    pub fn get_trip(&self, trip_id: &str) -> Option<Arc<Trip>> {
        self.riders
            .snapshot()
            .get(trip_id)
            .cloned()
            .or_else(|| self.drivers.snapshot().get(trip_id).cloned())
    }

    /// Check if a trip is registered.
    pub fn has_trip(&self, trip_id: &str) -> bool {
        self.get_trip(trip_id).is_some()
    }

    /// All active trips of one role.
    pub fn active_trips(&self, role: Role) -> Vec<Arc<Trip>> {
        self.partition(role).snapshot().trips().cloned().collect()
    }

    /// The registry partition of one role.
    pub fn partition(&self, role: Role) -> &RolePartition {
        match role {
            Role::Rider => &self.riders,
            Role::Driver => &self.drivers,
        }
    }

    /// Clear all trips.
    pub fn clear(&self) {
        self.riders.clear();
        self.drivers.clear();
    }

    /// Get engine statistics.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            riders: self.riders.len(),
            drivers: self.drivers.len(),
        }
    }

    fn lock_id(&self, trip_id: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        trip_id.hash(&mut hasher);
        self.id_locks[hasher.finish() as usize % ID_LOCK_STRIPES].lock()
    }
}

/// Outcome of a role reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleUpdateReport {
    pub role: Role,
    pub counts: ReconcileCounts,
    /// Trip IDs whose stored route failed to decode
    pub rejected: Vec<String>,
    /// New match sets of the opposite role's trips
    pub refreshed: Vec<MatchUpdate>,
}

/// Engine statistics for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub riders: usize,
    pub drivers: usize,
}

/// Score `trip` against a partition snapshot.
///
/// With a positive minimum overlap, trips whose bounding boxes stay more than
/// a corridor width apart cannot match and are skipped.
fn scan(trip: &Trip, pool: &PartitionSnapshot, config: &MatchConfig) -> Vec<MatchResult> {
    if config.min_overlap > 0.0 {
        let nearby = pool.near(trip, config.corridor_width_meters);
        score_all(trip, nearby.into_iter().map(|t| t.as_ref()), config)
    } else {
        score_all(trip, pool.trips().map(|t| t.as_ref()), config)
    }
}
