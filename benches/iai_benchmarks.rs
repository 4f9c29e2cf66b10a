//! Instruction-counting benchmarks using iai-callgrind.
//!
//! These benchmarks count CPU instructions for deterministic CI results.
//! Run with: `cargo bench --bench iai_benchmarks`
//!
//! Requires valgrind to be installed.

use iai_callgrind::{LibraryBenchmarkConfig, library_benchmark, library_benchmark_group, main};
use ridematch::corridor::{CorridorOverlap, corridor_overlap};
use ridematch::polyline::{decode, encode};
use ridematch::{GpsPoint, MatchConfig, MatchResult, Role, Trip, compute_matches};
use std::hint::black_box;

// ============================================================================
// Test Data Generation (deterministic, no RNG)
// ============================================================================

/// Straight north-east route of `points` vertices spanning ~1.5 km.
fn generate_route(start_lat: f64, start_lng: f64, points: usize) -> Vec<GpsPoint> {
    (0..points)
        .map(|i| {
            let progress = i as f64 / points as f64;
            GpsPoint::new(start_lat + progress * 0.01, start_lng + progress * 0.01)
        })
        .collect()
}

fn generate_drivers(count: usize) -> Vec<Trip> {
    (0..count)
        .map(|i| {
            // Every fourth driver sits ~5 km away
            let offset = if i % 4 == 3 { 0.05 } else { 0.0001 * i as f64 };
            Trip::new(
                format!("driver-{}", i),
                Role::Driver,
                generate_route(51.5 + offset, -0.1, 100),
                1_700_000_000,
            )
        })
        .collect()
}

// ============================================================================
// Codec Benchmarks
// ============================================================================

#[library_benchmark]
fn bench_encode_500_points() -> String {
    let route = generate_route(51.5, -0.1, 500);
    black_box(encode(black_box(&route)))
}

#[library_benchmark]
fn bench_decode_500_points() -> usize {
    let encoded = encode(&generate_route(51.5, -0.1, 500));
    black_box(decode(black_box(&encoded)).map(|r| r.len()).unwrap_or(0))
}

// ============================================================================
// Corridor Overlap Benchmarks
// ============================================================================

#[library_benchmark]
fn bench_overlap_identical_routes() -> CorridorOverlap {
    let route = generate_route(51.5, -0.1, 100);
    black_box(corridor_overlap(black_box(&route), black_box(&route), 300.0, 50.0))
}

#[library_benchmark]
fn bench_overlap_offset_routes() -> CorridorOverlap {
    let a = generate_route(51.5, -0.1, 100);
    let b = generate_route(51.5015, -0.1, 100);
    black_box(corridor_overlap(black_box(&a), black_box(&b), 300.0, 50.0))
}

#[library_benchmark]
fn bench_overlap_distant_routes() -> CorridorOverlap {
    let a = generate_route(51.5, -0.1, 100);
    let b = generate_route(52.0, 0.4, 100);
    black_box(corridor_overlap(black_box(&a), black_box(&b), 300.0, 50.0))
}

// ============================================================================
// Match Policy Benchmarks
// ============================================================================

#[library_benchmark]
fn bench_compute_matches_20_drivers() -> Vec<MatchResult> {
    let rider = Trip::new(
        "rider",
        Role::Rider,
        generate_route(51.5, -0.1, 100),
        1_700_000_600,
    );
    let drivers = generate_drivers(20);
    black_box(
        compute_matches(black_box(&rider), black_box(&drivers), &MatchConfig::default())
            .unwrap_or_default(),
    )
}

// ============================================================================
// Benchmark Groups
// ============================================================================

library_benchmark_group!(
    name = codec;
    benchmarks =
        bench_encode_500_points,
        bench_decode_500_points
);

library_benchmark_group!(
    name = corridor;
    benchmarks =
        bench_overlap_identical_routes,
        bench_overlap_offset_routes,
        bench_overlap_distant_routes
);

library_benchmark_group!(
    name = policy;
    benchmarks = bench_compute_matches_20_drivers
);

main!(
    config = LibraryBenchmarkConfig::default();
    library_benchmark_groups =
        codec,
        corridor,
        policy
);
