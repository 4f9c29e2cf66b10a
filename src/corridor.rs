//! Corridor overlap between two routes.
//!
//! Each route is resampled at a fixed arc-length step and every sample is
//! tested against a corridor of half-width `W` around the other route
//! (minimum point-to-segment distance on a local tangent plane). The covered
//! share of arc length gives a directional ratio; the reported ratio is the
//! smaller of the two directions, so a short route sitting inside a long one
//! does not count as a match for the long one.
//!
//! Alongside the ratio the calculator reports the cosine between the two net
//! travel directions (origin to destination), which lets the policy reject
//! routes that share a road but drive it in opposite directions.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::error::InvalidRouteError;
use crate::geo_utils::{LocalProjection, cumulative_distances, point_at_distance};
use crate::{GpsPoint, MatchConfig, Trip};

/// Fewest points a route needs to have a length and a direction.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Slack on the corridor edge for samples interpolated onto the other route,
/// which land a few nanometres off its projected segments.
pub const COVERAGE_TOLERANCE_METERS: f64 = 1e-6;

/// Overlap and direction between two routes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorOverlap {
    /// Share of the first route's arc length inside the second's corridor
    pub a_in_b: f64,
    /// Share of the second route's arc length inside the first's corridor
    pub b_in_a: f64,
    /// min(a_in_b, b_in_a)
    pub ratio: f64,
    /// Cosine between the two origin-to-destination vectors, in [-1, 1]
    pub direction_cosine: f64,
    /// Set when either route has fewer than two points or zero length
    pub degenerate: bool,
}

impl CorridorOverlap {
    /// Result for routes that cannot be compared: no overlap, no direction.
    pub fn degenerate() -> Self {
        Self {
            a_in_b: 0.0,
            b_in_a: 0.0,
            ratio: 0.0,
            direction_cosine: 0.0,
            degenerate: true,
        }
    }
}

/// A resampled point and its distance along the route from the first point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSample {
    pub point: GpsPoint,
    pub arc: f64,
}

/// Compute corridor overlap and direction cosine between two routes.
///
/// Routes with fewer than two points, or with zero length, yield the
/// [`CorridorOverlap::degenerate`] value. Deterministic and side-effect free;
/// swapping `a` and `b` swaps the directional ratios and leaves `ratio` and
/// `direction_cosine` unchanged.
///
/// # Example
/// ```
/// use ridematch::GpsPoint;
/// use ridematch::corridor::corridor_overlap;
///
/// let route = vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 0.1)];
/// let overlap = corridor_overlap(&route, &route, 300.0, 50.0);
/// assert_eq!(overlap.ratio, 1.0);
/// assert_eq!(overlap.direction_cosine, 1.0);
/// ```
pub fn corridor_overlap(
    a: &[GpsPoint],
    b: &[GpsPoint],
    corridor_width: f64,
    sample_spacing: f64,
) -> CorridorOverlap {
    if a.len() < MIN_ROUTE_POINTS || b.len() < MIN_ROUTE_POINTS {
        return CorridorOverlap::degenerate();
    }
    // One shared projection keeps both directions numerically identical.
    let Some(projection) = LocalProjection::for_routes(a, b) else {
        return CorridorOverlap::degenerate();
    };

    let samples_a = resample_by_spacing(a, sample_spacing);
    let samples_b = resample_by_spacing(b, sample_spacing);
    // A single sample means the route has no length.
    if samples_a.len() < 2 || samples_b.len() < 2 {
        return CorridorOverlap::degenerate();
    }

    // A route that ends where it starts has no net direction.
    let direction_cosine = match (
        net_direction(a, &projection),
        net_direction(b, &projection),
    ) {
        (Some(da), Some(db)) => direction_cosine(da, db),
        _ => 0.0,
    };

    let index_a = SegmentIndex::build(a, &projection);
    let index_b = SegmentIndex::build(b, &projection);

    let a_in_b = coverage_ratio(&samples_a, &index_b, &projection, corridor_width);
    let b_in_a = coverage_ratio(&samples_b, &index_a, &projection, corridor_width);

    CorridorOverlap {
        a_in_b,
        b_in_a,
        ratio: a_in_b.min(b_in_a),
        direction_cosine,
        degenerate: false,
    }
}

/// Strict variant for callers that treat a short route as an error rather
/// than as zero overlap.
pub fn try_corridor_overlap(
    a: &Trip,
    b: &Trip,
    config: &MatchConfig,
) -> Result<CorridorOverlap, InvalidRouteError> {
    for trip in [a, b] {
        if trip.route.len() < MIN_ROUTE_POINTS {
            return Err(InvalidRouteError {
                route_id: trip.id.clone(),
                point_count: trip.route.len(),
                minimum_required: MIN_ROUTE_POINTS,
            });
        }
    }
    Ok(corridor_overlap(
        &a.route,
        &b.route,
        config.corridor_width_meters,
        config.sample_spacing_meters,
    ))
}

/// Resample a route at a fixed arc-length step.
///
/// Samples sit at `0, s, 2s, ...` meters along the route, plus the final point
/// when the last step falls short of it. A route shorter than one step keeps
/// only its endpoints. A non-positive or non-finite step also keeps only the
/// endpoints.
pub fn resample_by_spacing(points: &[GpsPoint], spacing: f64) -> Vec<ArcSample> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let cumulative = cumulative_distances(points);
    let total = cumulative.last().copied().unwrap_or(0.0);

    if !total.is_finite() || total <= 0.0 {
        return vec![ArcSample {
            point: *first,
            arc: 0.0,
        }];
    }
    if !spacing.is_finite() || spacing <= 0.0 || total < spacing {
        return vec![
            ArcSample {
                point: *first,
                arc: 0.0,
            },
            ArcSample {
                point: *last,
                arc: total,
            },
        ];
    }

    let steps = (total / spacing).floor() as usize;
    let mut samples = Vec::with_capacity(steps + 2);
    for k in 0..=steps {
        let arc = k as f64 * spacing;
        samples.push(ArcSample {
            point: point_at_distance(points, &cumulative, arc),
            arc,
        });
    }
    if samples.last().is_some_and(|s| s.arc < total) {
        samples.push(ArcSample {
            point: *last,
            arc: total,
        });
    }

    samples
}

/// Covered arc length over total arc length.
///
/// Each gap between consecutive samples contributes its length weighted by
/// how many of its two endpoints are covered (0, ½ or 1).
fn coverage_ratio(
    samples: &[ArcSample],
    corridor: &SegmentIndex,
    projection: &LocalProjection,
    corridor_width: f64,
) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let reach = corridor_width + COVERAGE_TOLERANCE_METERS;
    let covered: Vec<bool> = samples
        .iter()
        .map(|s| corridor.min_distance(&projection.project(&s.point)) <= reach)
        .collect();

    let mut total = 0.0;
    let mut covered_length = 0.0;
    for i in 0..samples.len() - 1 {
        let gap = samples[i + 1].arc - samples[i].arc;
        let weight = (covered[i] as u8 + covered[i + 1] as u8) as f64 / 2.0;
        total += gap;
        covered_length += gap * weight;
    }

    if total <= 0.0 {
        return 0.0;
    }
    (covered_length / total).clamp(0.0, 1.0)
}

/// Projected origin-to-destination vector, or `None` when the route ends where
/// it starts.
fn net_direction(points: &[GpsPoint], projection: &LocalProjection) -> Option<[f64; 2]> {
    let start = projection.project(points.first()?);
    let end = projection.project(points.last()?);
    let v = [end[0] - start[0], end[1] - start[1]];
    if v[0] * v[0] + v[1] * v[1] > 0.0 {
        Some(v)
    } else {
        None
    }
}

fn direction_cosine(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1];
    let norms = ((a[0] * a[0] + a[1] * a[1]) * (b[0] * b[0] + b[1] * b[1])).sqrt();
    (dot / norms).clamp(-1.0, 1.0)
}

/// A route segment in projected meters.
#[derive(Debug, Clone, Copy)]
struct ProjectedSegment {
    from: [f64; 2],
    to: [f64; 2],
}

impl RTreeObject for ProjectedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.from, self.to)
    }
}

impl PointDistance for ProjectedSegment {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.to[0] - self.from[0];
        let dy = self.to[1] - self.from[1];
        let len_2 = dx * dx + dy * dy;

        // Zero-length segments degrade to point distance.
        let t = if len_2 > 0.0 {
            (((point[0] - self.from[0]) * dx + (point[1] - self.from[1]) * dy) / len_2)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };

        let cx = self.from[0] + t * dx - point[0];
        let cy = self.from[1] + t * dy - point[1];
        cx * cx + cy * cy
    }
}

/// R-tree over a route's projected segments for nearest-segment queries.
struct SegmentIndex {
    tree: RTree<ProjectedSegment>,
}

impl SegmentIndex {
    fn build(points: &[GpsPoint], projection: &LocalProjection) -> Self {
        let projected: Vec<[f64; 2]> = points.iter().map(|p| projection.project(p)).collect();
        let segments: Vec<ProjectedSegment> = projected
            .windows(2)
            .map(|w| ProjectedSegment {
                from: w[0],
                to: w[1],
            })
            .collect();
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    /// Distance in meters from `point` to the nearest segment.
    fn min_distance(&self, point: &[f64; 2]) -> f64 {
        self.tree
            .nearest_neighbor(point)
            .map(|segment| segment.distance_2(point).sqrt())
            .unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let segment = ProjectedSegment {
            from: [0.0, 0.0],
            to: [10.0, 0.0],
        };
        assert_eq!(segment.distance_2(&[5.0, 3.0]), 9.0);
        assert_eq!(segment.distance_2(&[-4.0, 0.0]), 16.0);
        assert_eq!(segment.distance_2(&[13.0, 4.0]), 25.0);
    }

    #[test]
    fn zero_length_segment_is_a_point() {
        let segment = ProjectedSegment {
            from: [1.0, 1.0],
            to: [1.0, 1.0],
        };
        assert_eq!(segment.distance_2(&[4.0, 5.0]), 25.0);
    }

    #[test]
    fn half_covered_gap_counts_half() {
        let samples = vec![
            ArcSample {
                point: GpsPoint::new(0.0, 0.0),
                arc: 0.0,
            },
            ArcSample {
                point: GpsPoint::new(0.0, 0.01),
                arc: 1000.0,
            },
        ];
        let projection = LocalProjection::new(GpsPoint::new(0.0, 0.0));
        // Corridor is a short stub around the first sample only.
        let stub = [GpsPoint::new(0.0, -0.0001), GpsPoint::new(0.0, 0.0001)];
        let index = SegmentIndex::build(&stub, &projection);
        let ratio = coverage_ratio(&samples, &index, &projection, 50.0);
        assert!((ratio - 0.5).abs() < 1e-12);
    }
}
