//! Tests for the polyline codec

use ridematch::polyline::{decode, encode, try_encode};
use ridematch::{DecodeError, EncodeError, GpsPoint, decode_route, encode_route};

#[test]
fn test_reference_vector() {
    // The canonical example of the compact polyline format.
    let route = vec![
        GpsPoint::new(38.5, -120.2),
        GpsPoint::new(40.7, -120.95),
        GpsPoint::new(43.252, -126.453),
    ];
    assert_eq!(encode(&route), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
}

#[test]
fn test_decode_reference_vector() {
    let route = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
    assert_eq!(
        route,
        vec![
            GpsPoint::new(38.5, -120.2),
            GpsPoint::new(40.7, -120.95),
            GpsPoint::new(43.252, -126.453),
        ]
    );
}

#[test]
fn test_empty() {
    assert_eq!(encode(&[]), "");
    assert!(decode("").unwrap().is_empty());
}

#[test]
fn test_single_point() {
    let route = vec![GpsPoint::new(51.5074, -0.1278)];
    let decoded = decode(&encode(&route)).unwrap();
    assert_eq!(decoded.len(), 1);
    assert!((decoded[0].latitude - 51.5074).abs() < 1e-9);
    assert!((decoded[0].longitude + 0.1278).abs() < 1e-9);
}

#[test]
fn test_rounds_to_five_decimals() {
    let route = vec![GpsPoint::new(47.123456789, 8.987654321)];
    let decoded = decode(&encode(&route)).unwrap();
    assert!((decoded[0].latitude - 47.12346).abs() < 1e-9);
    assert!((decoded[0].longitude - 8.98765).abs() < 1e-9);
}

#[test]
fn test_extreme_coordinates() {
    let route = vec![
        GpsPoint::new(-90.0, -180.0),
        GpsPoint::new(90.0, 180.0),
        GpsPoint::new(0.0, 0.0),
    ];
    assert_eq!(decode(&encode(&route)).unwrap(), route);
}

#[test]
fn test_invalid_character() {
    // A space sits below the polyline alphabet.
    let err = decode("_p~iF ps|U").unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidCharacter { character: ' ', .. }
    ));
    assert!(err.to_string().contains("' '"));
}

#[test]
fn test_non_ascii_is_rejected() {
    assert!(decode("_p~iF~ps|U\u{e9}").is_err());
}

#[test]
fn test_stream_ending_inside_a_point() {
    // '_' carries the continuation bit and nothing follows it.
    let err = decode("_p~iF~ps|U_").unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Truncated { .. } | DecodeError::MissingLongitude { .. }
    ));
}

#[test]
fn test_missing_longitude() {
    // A complete latitude value with no longitude after it.
    let err = decode("_p~iF").unwrap_err();
    assert!(matches!(err, DecodeError::MissingLongitude { .. }));
}

#[test]
fn test_try_encode_rejects_invalid_points() {
    let route = vec![GpsPoint::new(47.0, 8.0), GpsPoint::new(47.0, 181.0)];
    let err = try_encode(&route).unwrap_err();
    assert_eq!(
        err,
        EncodeError::InvalidPoint {
            index: 1,
            latitude: 47.0,
            longitude: 181.0
        }
    );
    assert!(try_encode(&[GpsPoint::new(f64::INFINITY, 0.0)]).is_err());
    assert_eq!(try_encode(&[]).unwrap(), "");
}

#[test]
fn test_try_encode_matches_encode_for_valid_routes() {
    let route = vec![GpsPoint::new(-33.8688, 151.2093), GpsPoint::new(-33.87, 151.21)];
    assert_eq!(try_encode(&route).unwrap(), encode(&route));
}

#[test]
fn test_surface_functions_match_module() {
    let route = vec![GpsPoint::new(52.52, 13.405), GpsPoint::new(52.53, 13.41)];
    let encoded = encode_route(&route);
    assert_eq!(encoded, encode(&route));
    assert_eq!(decode_route(&encoded).unwrap(), route);
}
