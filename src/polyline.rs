//! Compact route encoding.
//!
//! Routes travel between the routing provider, the trip store and the engine as
//! Google/Mapbox encoded polylines at [`PRECISION`] decimal digits. The codec
//! itself is the `polyline` crate; this module converts between [`GpsPoint`]
//! routes and the crate's `geo::LineString` (x = longitude, y = latitude) and
//! maps its errors into [`DecodeError`] / [`EncodeError`].
//!
//! # Example
//! ```
//! use ridematch::GpsPoint;
//! use ridematch::polyline::{decode, encode};
//!
//! let route = vec![GpsPoint::new(38.5, -120.2), GpsPoint::new(40.7, -120.95)];
//! let encoded = encode(&route);
//! assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC");
//! assert_eq!(decode(&encoded).unwrap(), route);
//! ```

use ::polyline::errors::PolylineError;
use geo::LineString;

use crate::GpsPoint;
use crate::error::{DecodeError, EncodeError};

/// Decimal digits kept per coordinate (1e-5 degrees, about 1.1 m).
pub const PRECISION: u32 = 5;

/// Encode points as a polyline string. An empty slice yields `""`.
///
/// Expects every point to pass [`GpsPoint::is_valid`]. Debug builds assert
/// it; release builds return an empty string for such input. Use
/// [`try_encode`] for points that have not been validated.
pub fn encode(points: &[GpsPoint]) -> String {
    debug_assert!(
        points.iter().all(GpsPoint::is_valid),
        "encode called with an invalid coordinate"
    );
    try_encode(points).unwrap_or_default()
}

/// Encode points, rejecting non-finite or out-of-range coordinates.
pub fn try_encode(points: &[GpsPoint]) -> Result<String, EncodeError> {
    if let Some(index) = points.iter().position(|p| !p.is_valid()) {
        let point = points[index];
        return Err(EncodeError::InvalidPoint {
            index,
            latitude: point.latitude,
            longitude: point.longitude,
        });
    }
    if points.is_empty() {
        return Ok(String::new());
    }

    let line: LineString<f64> = points.iter().map(|p| (p.longitude, p.latitude)).collect();
    ::polyline::encode_coordinates(line, PRECISION)
        .map_err(|e| EncodeError::Rejected(e.to_string()))
}

/// Decode a polyline string. An empty string yields an empty route.
pub fn decode(encoded: &str) -> Result<Vec<GpsPoint>, DecodeError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let line = ::polyline::decode_polyline(encoded, PRECISION).map_err(|err| match err {
        PolylineError::DecodeCharError { character, idx } => DecodeError::InvalidCharacter {
            position: idx,
            character,
        },
        PolylineError::NoLongError { idx } => DecodeError::MissingLongitude { position: idx },
        PolylineError::DecodeError { idx } => DecodeError::Truncated { position: idx },
        PolylineError::LatitudeCoordError { idx, .. }
        | PolylineError::LongitudeCoordError { idx, .. } => {
            DecodeError::OutOfRange { position: idx }
        }
        other => DecodeError::Malformed(other.to_string()),
    })?;

    Ok(line
        .coords()
        .map(|c| GpsPoint::new(c.y, c.x))
        .collect())
}
