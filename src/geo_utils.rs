//! Geographic utilities: great-circle distance, local planar projection and
//! bounding-box helpers.

use geo::{Distance, Haversine, Point};

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters (IUGG), the same radius `geo` uses for haversine.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Meters per degree of latitude (approximately constant).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Great-circle distance between two points in meters.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of a polyline in meters.
pub fn route_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Cumulative arc length along a polyline.
///
/// `dist[i]` is the great-circle distance travelled from the first point to
/// point `i`, so `dist[0] == 0.0` and the last entry is the route length.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(points.len());
    if points.is_empty() {
        return distances;
    }
    distances.push(0.0);

    for i in 1..points.len() {
        let prev_dist = distances[i - 1];
        distances.push(prev_dist + haversine_distance(&points[i - 1], &points[i]));
    }

    distances
}

/// Point at `target_dist` meters along the polyline.
///
/// Interpolates linearly in degrees between the two bracketing vertices, which
/// is accurate at the scale of a single route segment.
pub fn point_at_distance(points: &[GpsPoint], cumulative: &[f64], target_dist: f64) -> GpsPoint {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return GpsPoint::new(0.0, 0.0);
    };
    if target_dist <= 0.0 {
        return *first;
    }
    let total = cumulative.last().copied().unwrap_or(0.0);
    if target_dist >= total {
        return *last;
    }

    // First vertex strictly beyond the target; the segment starts one before it.
    let upper = cumulative.partition_point(|&d| d <= target_dist);
    let idx = upper.saturating_sub(1).min(points.len() - 2);

    let seg_start = cumulative[idx];
    let seg_length = cumulative[idx + 1] - seg_start;
    if seg_length <= f64::EPSILON {
        return points[idx];
    }

    let ratio = (target_dist - seg_start) / seg_length;
    let p1 = &points[idx];
    let p2 = &points[idx + 1];
    GpsPoint::new(
        p1.latitude + ratio * (p2.latitude - p1.latitude),
        wrap_longitude(p1.longitude + ratio * longitude_delta(p1.longitude, p2.longitude)),
    )
}

/// Signed longitude change from `from` to `to` the short way round, in
/// [-180, 180].
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    wrap_longitude(to - from)
}

/// Bring a longitude within one turn of the valid range back into
/// [-180, 180].
pub fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// Equirectangular projection around a reference point.
///
/// Maps degrees to meters on a tangent plane. Errors stay well under a meter
/// across the few-kilometre extent a corridor test looks at, which is all the
/// overlap calculator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: GpsPoint,
    cos_lat: f64,
}

impl LocalProjection {
    /// Projection centred on `origin`.
    pub fn new(origin: GpsPoint) -> Self {
        Self {
            origin,
            cos_lat: origin.latitude.to_radians().cos(),
        }
    }

    /// Projection centred on the combined extent of two routes.
    ///
    /// When the points straddle the antimeridian the longitude extent is taken
    /// across it, so the origin lands next to the routes rather than on the
    /// far side of the globe. Depends only on the set of points, not on their
    /// order or on which route they belong to. Returns `None` for no points.
    pub fn for_routes(a: &[GpsPoint], b: &[GpsPoint]) -> Option<Self> {
        let mut points = a.iter().chain(b).peekable();
        points.peek()?;

        let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
        let (mut min_lng, mut max_lng) = (f64::MAX, f64::MIN);
        // Longitudes shifted into [0, 360)
        let (mut min_east, mut max_east) = (f64::MAX, f64::MIN);

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
            let east = if p.longitude < 0.0 {
                p.longitude + 360.0
            } else {
                p.longitude
            };
            min_east = min_east.min(east);
            max_east = max_east.max(east);
        }

        let center_lng = if max_east - min_east < max_lng - min_lng {
            wrap_longitude((min_east + max_east) / 2.0)
        } else {
            (min_lng + max_lng) / 2.0
        };
        Some(Self::new(GpsPoint::new(
            (min_lat + max_lat) / 2.0,
            center_lng,
        )))
    }

    /// Planar `[x, y]` coordinates in meters (x east, y north).
    pub fn project(&self, point: &GpsPoint) -> [f64; 2] {
        let dlng = longitude_delta(self.origin.longitude, point.longitude);
        let dlat = point.latitude - self.origin.latitude;
        [
            dlng.to_radians() * EARTH_RADIUS_METERS * self.cos_lat,
            dlat.to_radians() * EARTH_RADIUS_METERS,
        ]
    }

    pub fn origin(&self) -> GpsPoint {
        self.origin
    }
}

/// Compute bounds for a GPS track.
///
/// Returns an all-zero box for an empty track.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    Bounds::from_points(points).unwrap_or(Bounds {
        min_lat: 0.0,
        max_lat: 0.0,
        min_lng: 0.0,
        max_lng: 0.0,
    })
}

/// Meters per degree of arc on the sphere [`LocalProjection`] projects onto.
fn meters_per_degree() -> f64 {
    EARTH_RADIUS_METERS.to_radians()
}

/// Convert meters to degrees of longitude at `latitude` (the wider of the two
/// axes, so it is safe as an isotropic buffer).
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
    meters / (meters_per_degree() * cos_lat)
}

/// Grow a bounding box by `buffer_meters` in every direction.
///
/// Uses the same scale as [`LocalProjection`], so a point within
/// `buffer_meters` of the box on the projected plane lies inside the result.
pub fn expand_bounds(bounds: &Bounds, buffer_meters: f64) -> Bounds {
    let lat_buffer = buffer_meters / meters_per_degree();
    let extreme_lat = (bounds.min_lat - lat_buffer)
        .abs()
        .max((bounds.max_lat + lat_buffer).abs())
        .min(90.0);
    let lng_buffer = meters_to_degrees(buffer_meters, extreme_lat);
    Bounds {
        min_lat: bounds.min_lat - lat_buffer,
        max_lat: bounds.max_lat + lat_buffer,
        min_lng: bounds.min_lng - lng_buffer,
        max_lng: bounds.max_lng + lng_buffer,
    }
}

/// Whether two boxes overlap once each is grown by `buffer_meters`.
pub fn bounds_overlap(a: &Bounds, b: &Bounds, buffer_meters: f64) -> bool {
    let a = expand_bounds(a, buffer_meters);
    a.min_lat <= b.max_lat
        && b.min_lat <= a.max_lat
        && a.min_lng <= b.max_lng
        && b.min_lng <= a.max_lng
}
