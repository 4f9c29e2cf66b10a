//! Spatial prefilter for candidate lookup.
//!
//! Uses an R-tree of trip bounding boxes so a registration only scores trips
//! whose route could come within a corridor width of its own.

use rstar::{AABB, RTree, RTreeObject};

use crate::geo_utils::expand_bounds;
use crate::{Bounds, Trip};

/// Trip bounds wrapper for R-tree spatial indexing.
#[derive(Debug, Clone)]
pub struct TripBounds {
    pub trip_id: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl TripBounds {
    pub fn from_trip(trip: &Trip) -> Option<Self> {
        trip.bounds().map(|b| Self {
            trip_id: trip.id.clone(),
            min_lat: b.min_lat,
            max_lat: b.max_lat,
            min_lng: b.min_lng,
            max_lng: b.max_lng,
        })
    }
}

impl RTreeObject for TripBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// Immutable R-tree over the routes of one role partition.
///
/// Rebuilt in bulk whenever the partition publishes a new snapshot.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<TripBounds>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from trips. Trips without a route are skipped.
    pub fn build<'a>(trips: impl IntoIterator<Item = &'a Trip>) -> Self {
        let bounds: Vec<TripBounds> = trips.into_iter().filter_map(TripBounds::from_trip).collect();
        Self {
            tree: RTree::bulk_load(bounds),
        }
    }

    /// Trips whose bounding box intersects `bounds`.
    pub fn query(&self, bounds: &Bounds) -> Vec<&str> {
        let search = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );

        self.tree
            .locate_in_envelope_intersecting(&search)
            .map(|b| b.trip_id.as_str())
            .collect()
    }

    /// Trips whose bounding box comes within `buffer_meters` of `bounds`.
    ///
    /// A search box pushed past ±180° longitude also searches the matching
    /// strip on the other side of the antimeridian.
    pub fn query_within(&self, bounds: &Bounds, buffer_meters: f64) -> Vec<&str> {
        let search = expand_bounds(bounds, buffer_meters);
        let mut found = self.query(&search);

        let wrapped = if search.max_lng > 180.0 {
            Some((-180.0, search.max_lng - 360.0))
        } else if search.min_lng < -180.0 {
            Some((search.min_lng + 360.0, 180.0))
        } else {
            None
        };
        if let Some((min_lng, max_lng)) = wrapped {
            found.extend(self.query(&Bounds {
                min_lng,
                max_lng,
                ..search
            }));
            found.sort_unstable();
            found.dedup();
        }
        found
    }

    /// Get the number of indexed trips.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
