//! Integration tests for SpatialIndex

use ridematch::engine::{SpatialIndex, TripBounds};
use ridematch::{Bounds, GpsPoint, Role, Trip};

fn london() -> Trip {
    let route = (0..10)
        .map(|i| GpsPoint::new(51.5074 + i as f64 * 0.001, -0.1278))
        .collect();
    Trip::new("london", Role::Driver, route, 0)
}

fn nyc() -> Trip {
    let route = (0..10)
        .map(|i| GpsPoint::new(40.7128 + i as f64 * 0.001, -74.0060))
        .collect();
    Trip::new("nyc", Role::Driver, route, 0)
}

#[test]
fn test_build() {
    let trips = [london(), nyc()];
    let index = SpatialIndex::build(&trips);
    assert_eq!(index.len(), 2);
    assert!(!index.is_empty());
}

#[test]
fn test_empty_routes_are_skipped() {
    let empty = Trip::new("empty", Role::Rider, Vec::new(), 0);
    assert!(TripBounds::from_trip(&empty).is_none());
    let index = SpatialIndex::build([&empty]);
    assert!(index.is_empty());
}

#[test]
fn test_query_london() {
    let trips = [london(), nyc()];
    let index = SpatialIndex::build(&trips);

    let results = index.query(&Bounds {
        min_lat: 51.5,
        max_lat: 51.52,
        min_lng: -0.15,
        max_lng: -0.10,
    });
    assert_eq!(results, vec!["london"]);
}

#[test]
fn test_query_nothing_nearby() {
    let trips = [london(), nyc()];
    let index = SpatialIndex::build(&trips);

    let results = index.query(&Bounds {
        min_lat: 48.8,
        max_lat: 48.9,
        min_lng: 2.3,
        max_lng: 2.4,
    });
    assert!(results.is_empty());
}

#[test]
fn test_query_within_buffer() {
    let trips = [london()];
    let index = SpatialIndex::build(&trips);

    // A box starting ~550 m east of the route's longitude
    let beside = Bounds {
        min_lat: 51.508,
        max_lat: 51.510,
        min_lng: -0.12,
        max_lng: -0.11,
    };
    assert!(index.query(&beside).is_empty());
    assert!(index.query_within(&beside, 300.0).is_empty());
    assert_eq!(index.query_within(&beside, 1000.0), vec!["london"]);
}

#[test]
fn test_query_within_wraps_antimeridian() {
    let east_route = (0..5)
        .map(|i| GpsPoint::new(i as f64 * 0.005, 179.999))
        .collect();
    let west_route = (0..5)
        .map(|i| GpsPoint::new(i as f64 * 0.005, -179.999))
        .collect();
    let east = Trip::new("east", Role::Rider, east_route, 0);
    let west = Trip::new("west", Role::Driver, west_route, 0);

    let index = SpatialIndex::build([&west]);
    let bounds = east.bounds().unwrap();
    assert!(index.query(&bounds).is_empty());
    assert_eq!(index.query_within(&bounds, 300.0), vec!["west"]);
    assert!(index.query_within(&bounds, 100.0).is_empty());

    // And from the other side.
    let index = SpatialIndex::build([&east]);
    assert_eq!(
        index.query_within(&west.bounds().unwrap(), 300.0),
        vec!["east"]
    );
}
