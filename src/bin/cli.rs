//! ridematch CLI - Debug tool for route encoding and trip matching
//!
//! Usage:
//!   ridematch-cli encode <route.gpx|route.json>
//!   ridematch-cli decode <polyline> [--gpx <out.gpx>]
//!   ridematch-cli score <polyline-a> <polyline-b> [--config <config.json>]
//!   ridematch-cli match <trips.json> [--trip <id>] [--config <config.json>]
//!
//! `trips.json` holds an array of stored trip records (camelCase, with an
//! `encodedPolyline` per trip), the same shape the trip store keeps.

use clap::{Parser, Subcommand};
use gpx::{Gpx, read};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use ridematch::{
    GpsPoint, MatchConfig, MatchResult, Trip, TripRecord, compute_matches, corridor_overlap,
    polyline,
};

#[derive(Parser)]
#[command(name = "ridematch-cli")]
#[command(about = "Debug tool for route encoding and trip matching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a GPX track or a JSON point array as a polyline
    Encode {
        /// GPX file, or JSON array of {latitude, longitude}
        file: PathBuf,
    },

    /// Decode a polyline into points
    Decode {
        polyline: String,

        /// Write the route to a GPX file instead of printing JSON
        #[arg(long)]
        gpx: Option<PathBuf>,
    },

    /// Show the corridor overlap between two encoded routes
    Score {
        a: String,
        b: String,

        /// JSON match config (missing keys take defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Match trips from a JSON array of trip records
    Match {
        trips: PathBuf,

        /// Only match this trip against the others
        #[arg(short, long)]
        trip: Option<String>,

        /// JSON match config (missing keys take defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also list pairs that did not match
        #[arg(long)]
        near_misses: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Encode { file } => run_encode(&file),
        Commands::Decode { polyline, gpx } => run_decode(&polyline, gpx.as_deref()),
        Commands::Score { a, b, config } => run_score(&a, &b, config.as_deref()),
        Commands::Match {
            trips,
            trip,
            config,
            near_misses,
        } => run_match(&trips, trip.as_deref(), config.as_deref(), near_misses),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MatchConfig, String> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            MatchConfig::from_json(&json).map_err(|e| e.to_string())
        }
        None => Ok(MatchConfig::default()),
    }
}

// ============================================================================
// encode / decode
// ============================================================================

fn run_encode(file: &Path) -> Result<(), String> {
    let points = if file.extension().is_some_and(|ext| ext == "gpx") {
        parse_gpx_file(file)?
    } else {
        let json = fs::read_to_string(file).map_err(|e| format!("{}: {}", file.display(), e))?;
        serde_json::from_str::<Vec<GpsPoint>>(&json).map_err(|e| e.to_string())?
    };

    info!("Encoding {} points from {}", points.len(), file.display());
    let encoded = polyline::try_encode(&points).map_err(|e| e.to_string())?;
    println!("{}", encoded);
    Ok(())
}

fn run_decode(encoded: &str, gpx_out: Option<&Path>) -> Result<(), String> {
    let points = polyline::decode(encoded).map_err(|e| e.to_string())?;
    info!(
        "Decoded {} points, {:.2} km",
        points.len(),
        ridematch::geo_utils::route_length(&points) / 1000.0
    );

    match gpx_out {
        Some(path) => write_gpx_file(path, &points, "decoded route").map_err(|e| e.to_string()),
        None => {
            let json = serde_json::to_string_pretty(&points).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Extract all track points from a GPX file
fn parse_gpx_file(path: &Path) -> Result<Vec<GpsPoint>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let gpx: Gpx = read(BufReader::new(file)).map_err(|e| e.to_string())?;

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for pt in &segment.points {
                let p = pt.point();
                points.push(GpsPoint::new(p.y(), p.x()));
            }
        }
    }
    // Planned routes come as <rte> rather than <trk>.
    for route in &gpx.routes {
        for pt in &route.points {
            let p = pt.point();
            points.push(GpsPoint::new(p.y(), p.x()));
        }
    }

    if points.is_empty() {
        return Err("No track points found".to_string());
    }
    Ok(points)
}

fn write_gpx_file(path: &Path, points: &[GpsPoint], name: &str) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<gpx version="1.1" creator="ridematch-cli" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;
    writeln!(writer, "  <trk>")?;
    writeln!(writer, "    <name>{}</name>", escape_xml(name))?;
    writeln!(writer, "    <trkseg>")?;
    for point in points {
        writeln!(
            writer,
            r#"      <trkpt lat="{:.6}" lon="{:.6}"></trkpt>"#,
            point.latitude, point.longitude
        )?;
    }
    writeln!(writer, "    </trkseg>")?;
    writeln!(writer, "  </trk>")?;
    writeln!(writer, "</gpx>")?;
    writer.flush()
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// score / match
// ============================================================================

fn run_score(a: &str, b: &str, config_path: Option<&Path>) -> Result<(), String> {
    let config = load_config(config_path)?;
    let route_a = polyline::decode(a).map_err(|e| format!("route a: {}", e))?;
    let route_b = polyline::decode(b).map_err(|e| format!("route b: {}", e))?;

    let overlap = corridor_overlap(
        &route_a,
        &route_b,
        config.corridor_width_meters,
        config.sample_spacing_meters,
    );

    println!("\n{}", "=".repeat(60));
    println!(
        "Corridor overlap (W = {:.0} m, s = {:.0} m)",
        config.corridor_width_meters, config.sample_spacing_meters
    );
    println!("{}", "=".repeat(60));
    println!("  a in b:     {:.3}", overlap.a_in_b);
    println!("  b in a:     {:.3}", overlap.b_in_a);
    println!("  ratio:      {:.3}", overlap.ratio);
    println!("  direction:  {:.3}", overlap.direction_cosine);
    if overlap.degenerate {
        println!("  (at least one route is degenerate)");
    }
    Ok(())
}

fn run_match(
    trips_path: &Path,
    only: Option<&str>,
    config_path: Option<&Path>,
    near_misses: bool,
) -> Result<(), String> {
    let config = load_config(config_path)?;
    let json =
        fs::read_to_string(trips_path).map_err(|e| format!("{}: {}", trips_path.display(), e))?;
    let records: Vec<TripRecord> = serde_json::from_str(&json).map_err(|e| e.to_string())?;

    let mut trips = Vec::with_capacity(records.len());
    for record in &records {
        match Trip::from_record(record) {
            Ok(trip) => trips.push(trip),
            Err(e) => eprintln!("  Skipping {}: {}", record.id, e),
        }
    }
    info!("Loaded {} of {} trips", trips.len(), records.len());

    let candidates: Vec<&Trip> = match only {
        Some(id) => {
            let trip = trips
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("no trip with id {}", id))?;
            vec![trip]
        }
        None => trips.iter().collect(),
    };

    for candidate in candidates {
        let start = std::time::Instant::now();
        let results = compute_matches(candidate, &trips, &config).map_err(|e| e.to_string())?;
        debug!("Scored {} in {:?}", candidate.id, start.elapsed());

        println!("\n{} ({})", candidate.id, candidate.role);
        let mut shown = 0;
        for result in &results {
            if result.is_match || near_misses {
                print_result(result);
                shown += 1;
            }
        }
        if shown == 0 {
            println!("  no matches");
        }
    }
    Ok(())
}

fn print_result(result: &MatchResult) {
    let verdict = match result.rejection {
        None => "MATCH".to_string(),
        Some(reason) => format!("{:?}", reason),
    };
    println!(
        "  {:<20} {:>3}%  cos {:>6.3}  {}",
        result.other_trip_id, result.match_percentage, result.direction_cosine, verdict
    );
}
