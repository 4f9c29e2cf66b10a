//! Role-partitioned registry of active trips.
//!
//! Each role keeps its trips in an immutable [`PartitionSnapshot`] behind an
//! [`ArcSwap`]. Readers load the current snapshot without locking and keep
//! scanning it even if a writer publishes a newer one meanwhile. Writers for
//! the same role serialize on a mutex, copy the map, apply their change and
//! publish the result in one atomic store.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::{Role, Trip};

use super::spatial_index::SpatialIndex;

/// One published view of a role's active trips.
#[derive(Debug, Default)]
pub struct PartitionSnapshot {
    trips: HashMap<String, Arc<Trip>>,
    index: SpatialIndex,
}

impl PartitionSnapshot {
    fn from_trips(trips: HashMap<String, Arc<Trip>>) -> Self {
        let index = SpatialIndex::build(trips.values().map(|t| t.as_ref()));
        Self { trips, index }
    }

    /// Get a trip by ID.
    pub fn get(&self, id: &str) -> Option<&Arc<Trip>> {
        self.trips.get(id)
    }

    /// Check if a trip exists.
    pub fn contains(&self, id: &str) -> bool {
        self.trips.contains_key(id)
    }

    /// All trips in this snapshot.
    pub fn trips(&self) -> impl Iterator<Item = &Arc<Trip>> {
        self.trips.values()
    }

    /// Trips whose route passes within `buffer_meters` of `trip`'s bounding box.
    pub fn near(&self, trip: &Trip, buffer_meters: f64) -> Vec<&Arc<Trip>> {
        let Some(bounds) = trip.bounds() else {
            return Vec::new();
        };
        self.index
            .query_within(&bounds, buffer_meters)
            .into_iter()
            .filter_map(|id| self.trips.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// Changes applied by [`RolePartition::replace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// The active trips of one role.
#[derive(Debug)]
pub struct RolePartition {
    role: Role,
    current: ArcSwap<PartitionSnapshot>,
    writer: Mutex<()>,
}

impl RolePartition {
    /// Create an empty partition.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            current: ArcSwap::from_pointee(PartitionSnapshot::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<PartitionSnapshot> {
        self.current.load_full()
    }

    /// Insert or replace a trip. Returns the previous version, if any.
    pub fn upsert(&self, trip: Arc<Trip>) -> Option<Arc<Trip>> {
        self.publish(|trips| trips.insert(trip.id.clone(), trip))
    }

    /// Remove a trip. Removing an unknown id is a no-op and publishes nothing.
    pub fn remove(&self, id: &str) -> Option<Arc<Trip>> {
        let _guard = self.writer.lock();
        let current = self.current.load();
        if !current.contains(id) {
            return None;
        }
        let mut trips = current.trips.clone();
        let removed = trips.remove(id);
        self.current.store(Arc::new(PartitionSnapshot::from_trips(trips)));
        removed
    }

    /// Replace the whole partition with `trips`, reusing unchanged entries.
    pub fn replace(&self, trips: impl IntoIterator<Item = Trip>) -> ReconcileCounts {
        let _guard = self.writer.lock();
        let current = self.current.load();
        let mut counts = ReconcileCounts::default();

        // A repeated id keeps its last version and is counted once.
        let mut latest: HashMap<String, Trip> = HashMap::new();
        for trip in trips {
            latest.insert(trip.id.clone(), trip);
        }

        let mut next: HashMap<String, Arc<Trip>> = HashMap::with_capacity(latest.len());
        for (id, trip) in latest {
            let entry = match current.trips.get(&id) {
                Some(existing) if existing.as_ref() == &trip => {
                    counts.unchanged += 1;
                    Arc::clone(existing)
                }
                Some(_) => {
                    counts.updated += 1;
                    Arc::new(trip)
                }
                None => {
                    counts.added += 1;
                    Arc::new(trip)
                }
            };
            next.insert(id, entry);
        }

        counts.removed = current
            .trips
            .keys()
            .filter(|id| !next.contains_key(id.as_str()))
            .count();

        self.current.store(Arc::new(PartitionSnapshot::from_trips(next)));
        counts
    }

    /// Drop every trip.
    pub fn clear(&self) {
        let _guard = self.writer.lock();
        self.current.store(Arc::new(PartitionSnapshot::default()));
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    fn publish<R>(&self, apply: impl FnOnce(&mut HashMap<String, Arc<Trip>>) -> R) -> R {
        let _guard = self.writer.lock();
        let mut trips = self.current.load().trips.clone();
        let out = apply(&mut trips);
        self.current.store(Arc::new(PartitionSnapshot::from_trips(trips)));
        out
    }
}
