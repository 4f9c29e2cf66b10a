//! Tests for corridor overlap

use ridematch::corridor::{MIN_ROUTE_POINTS, corridor_overlap, resample_by_spacing};
use ridematch::geo_utils::route_length;
use ridematch::{GpsPoint, MatchConfig, Role, Trip, try_corridor_overlap};

/// Straight route with `n` evenly spaced points
fn line(from: (f64, f64), to: (f64, f64), n: usize) -> Vec<GpsPoint> {
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            GpsPoint::new(
                from.0 + t * (to.0 - from.0),
                from.1 + t * (to.1 - from.1),
            )
        })
        .collect()
}

/// An L-shaped route: east along the equator, then north
fn dogleg() -> Vec<GpsPoint> {
    vec![
        GpsPoint::new(0.0, 0.0),
        GpsPoint::new(0.0, 0.02),
        GpsPoint::new(0.015, 0.02),
        GpsPoint::new(0.03, 0.021),
    ]
}

#[test]
fn test_identical_routes() {
    let route = dogleg();
    let overlap = corridor_overlap(&route, &route, 300.0, 50.0);
    assert_eq!(overlap.ratio, 1.0);
    assert_eq!(overlap.a_in_b, 1.0);
    assert_eq!(overlap.b_in_a, 1.0);
    assert_eq!(overlap.direction_cosine, 1.0);
    assert!(!overlap.degenerate);
}

#[test]
fn test_parallel_route_inside_corridor() {
    // ~100 m north of the first route
    let a = line((0.0, 0.0), (0.0, 0.05), 20);
    let b = line((0.0009, 0.0), (0.0009, 0.05), 7);

    let wide = corridor_overlap(&a, &b, 300.0, 50.0);
    assert_eq!(wide.ratio, 1.0);
    assert!(wide.direction_cosine > 0.999);

    let narrow = corridor_overlap(&a, &b, 50.0, 50.0);
    assert_eq!(narrow.ratio, 0.0);
}

#[test]
fn test_short_route_inside_long_one() {
    let long = line((0.0, 0.0), (0.0, 0.1), 50);
    let short = line((0.0, 0.02), (0.0, 0.04), 5);

    let overlap = corridor_overlap(&short, &long, 300.0, 50.0);
    assert_eq!(overlap.a_in_b, 1.0);
    // The short route covers about a quarter of the long one.
    assert!(overlap.b_in_a > 0.2 && overlap.b_in_a < 0.3, "{}", overlap.b_in_a);
    assert_eq!(overlap.ratio, overlap.b_in_a);
}

#[test]
fn test_swapping_swaps_directional_ratios() {
    let long = line((0.0, 0.0), (0.0, 0.1), 50);
    let short = line((0.0, 0.02), (0.0, 0.04), 5);

    let ab = corridor_overlap(&short, &long, 300.0, 50.0);
    let ba = corridor_overlap(&long, &short, 300.0, 50.0);
    assert_eq!(ab.a_in_b, ba.b_in_a);
    assert_eq!(ab.b_in_a, ba.a_in_b);
    assert_eq!(ab.ratio, ba.ratio);
    assert_eq!(ab.direction_cosine, ba.direction_cosine);
}

#[test]
fn test_reversed_route() {
    let a = line((0.0, 0.0), (0.0, 0.05), 10);
    let b: Vec<GpsPoint> = a.iter().rev().copied().collect();

    let overlap = corridor_overlap(&a, &b, 300.0, 50.0);
    assert_eq!(overlap.ratio, 1.0);
    assert!(overlap.direction_cosine < -0.999);
}

#[test]
fn test_perpendicular_routes() {
    let east = line((0.0, -0.02), (0.0, 0.02), 10);
    let north = line((-0.02, 0.0), (0.02, 0.0), 10);

    let overlap = corridor_overlap(&east, &north, 300.0, 50.0);
    assert!(overlap.direction_cosine.abs() < 1e-9);
    // Only the stretch around the crossing is shared.
    assert!(overlap.ratio > 0.0 && overlap.ratio < 0.2);
}

#[test]
fn test_far_apart_routes() {
    let a = line((0.0, 0.0), (0.0, 0.05), 10);
    let b = line((0.045, 0.0), (0.045, 0.05), 10);
    let overlap = corridor_overlap(&a, &b, 300.0, 50.0);
    assert_eq!(overlap.ratio, 0.0);
    assert!(!overlap.degenerate);
}

#[test]
fn test_single_point_route_is_degenerate() {
    let a = vec![GpsPoint::new(0.0, 0.0)];
    let b = line((0.0, 0.0), (0.0, 0.05), 10);
    for overlap in [
        corridor_overlap(&a, &b, 300.0, 50.0),
        corridor_overlap(&b, &a, 300.0, 50.0),
    ] {
        assert!(overlap.degenerate);
        assert_eq!(overlap.ratio, 0.0);
        assert_eq!(overlap.direction_cosine, 0.0);
    }
}

#[test]
fn test_empty_route_is_degenerate() {
    let b = line((0.0, 0.0), (0.0, 0.05), 10);
    assert!(corridor_overlap(&[], &b, 300.0, 50.0).degenerate);
}

#[test]
fn test_zero_length_route_is_degenerate() {
    let stuck = vec![GpsPoint::new(0.0, 0.01); 3];
    let b = line((0.0, 0.0), (0.0, 0.05), 10);
    let overlap = corridor_overlap(&stuck, &b, 300.0, 50.0);
    assert!(overlap.degenerate);
    assert_eq!(overlap.ratio, 0.0);
}

#[test]
fn test_loop_route_has_no_direction() {
    let ring = vec![
        GpsPoint::new(0.0, 0.0),
        GpsPoint::new(0.0, 0.01),
        GpsPoint::new(0.01, 0.01),
        GpsPoint::new(0.01, 0.0),
        GpsPoint::new(0.0, 0.0),
    ];
    let overlap = corridor_overlap(&ring, &ring, 300.0, 50.0);
    assert!(!overlap.degenerate);
    assert_eq!(overlap.ratio, 1.0);
    assert_eq!(overlap.direction_cosine, 0.0);
}

#[test]
fn test_wider_corridor_never_lowers_overlap() {
    let a = dogleg();
    let b = line((0.0, 0.0), (0.0, 0.03), 10);

    let mut last = 0.0;
    for width in [0.0, 50.0, 150.0, 300.0, 1000.0, 5000.0] {
        let ratio = corridor_overlap(&a, &b, width, 50.0).ratio;
        assert!(ratio >= last, "width {width}: {ratio} < {last}");
        last = ratio;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn test_resample_spacing() {
    let route = line((0.0, 0.0), (0.0, 0.01), 2);
    let total = route_length(&route);
    let samples = resample_by_spacing(&route, 300.0);

    let arcs: Vec<f64> = samples.iter().map(|s| s.arc).collect();
    assert_eq!(arcs[..4], [0.0, 300.0, 600.0, 900.0]);
    assert_eq!(samples.len(), 5);
    assert_eq!(arcs[4], total);
    assert_eq!(samples[0].point, route[0]);
    assert_eq!(samples[4].point, route[1]);
}

#[test]
fn test_resample_short_route_keeps_endpoints() {
    let route = line((0.0, 0.0), (0.0, 0.0001), 3);
    let samples = resample_by_spacing(&route, 50.0);
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].point, route[0]);
    assert_eq!(samples[1].point, route[2]);
}

#[test]
fn test_resample_ignores_vertex_density() {
    let sparse = line((0.0, 0.0), (0.0, 0.02), 2);
    let dense = line((0.0, 0.0), (0.0, 0.02), 200);
    assert_eq!(
        resample_by_spacing(&sparse, 50.0).len(),
        resample_by_spacing(&dense, 50.0).len()
    );
}

#[test]
fn test_strict_variant_rejects_short_routes() {
    let good = Trip::new("good", Role::Rider, line((0.0, 0.0), (0.0, 0.01), 5), 0);
    let bad = Trip::new("bad", Role::Driver, vec![GpsPoint::new(0.0, 0.0)], 0);

    let err = try_corridor_overlap(&good, &bad, &MatchConfig::default()).unwrap_err();
    assert_eq!(err.route_id, "bad");
    assert_eq!(err.point_count, 1);
    assert_eq!(err.minimum_required, MIN_ROUTE_POINTS);

    let ok = try_corridor_overlap(&good, &good, &MatchConfig::default()).unwrap();
    assert_eq!(ok.ratio, 1.0);
}

#[test]
fn test_identical_routes_with_zero_width_corridor() {
    let route = line((47.1234, 8.5678), (47.1534, 8.6178), 2);
    let overlap = corridor_overlap(&route, &route, 0.0, 50.0);
    assert_eq!(overlap.ratio, 1.0);
    assert_eq!(overlap.direction_cosine, 1.0);

    let bent = dogleg();
    assert_eq!(corridor_overlap(&bent, &bent, 0.0, 50.0).ratio, 1.0);
}

#[test]
fn test_zero_width_corridor_still_excludes_neighbours() {
    let a = line((0.0, 0.0), (0.0, 0.02), 2);
    let b = line((0.0001, 0.0), (0.0001, 0.02), 2);
    assert_eq!(corridor_overlap(&a, &b, 0.0, 50.0).ratio, 0.0);
}

#[test]
fn test_route_across_antimeridian_ignores_vertex_placement() {
    let a = vec![GpsPoint::new(10.0, 179.98), GpsPoint::new(10.0, -179.98)];
    let b = vec![
        GpsPoint::new(10.0, 179.98),
        GpsPoint::new(10.0, 180.0),
        GpsPoint::new(10.0, -179.98),
    ];
    let overlap = corridor_overlap(&a, &b, 50.0, 50.0);
    assert_eq!(overlap.a_in_b, 1.0);
    assert_eq!(overlap.b_in_a, 1.0);
    assert!(overlap.direction_cosine > 0.999);

    // Same geometry shifted to the prime meridian scores the same.
    let a0 = vec![GpsPoint::new(10.0, -0.02), GpsPoint::new(10.0, 0.02)];
    let b0 = vec![
        GpsPoint::new(10.0, -0.02),
        GpsPoint::new(10.0, 0.0),
        GpsPoint::new(10.0, 0.02),
    ];
    let shifted = corridor_overlap(&a0, &b0, 50.0, 50.0);
    assert_eq!(shifted.ratio, overlap.ratio);
}

#[test]
fn test_neighbours_either_side_of_antimeridian() {
    // ~220 m apart, heading north on opposite sides of 180°
    let east = line((0.0, 179.999), (0.02, 179.999), 5);
    let west = line((0.0, -179.999), (0.02, -179.999), 5);
    let overlap = corridor_overlap(&east, &west, 300.0, 50.0);
    assert_eq!(overlap.ratio, 1.0);
    assert!(overlap.direction_cosine > 0.999);
    assert_eq!(corridor_overlap(&east, &west, 100.0, 50.0).ratio, 0.0);
}
