//! OpenRouteService directions client.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{RouteResponse, RoutingProvider};
use crate::GpsPoint;
use crate::error::RoutingError;

const DEFAULT_ENDPOINT: &str = "https://api.openrouteservice.org";
const DEFAULT_PROFILE: &str = "driving-car";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach OpenRouteService.
#[derive(Debug, Clone, PartialEq)]
pub struct OrsConfig {
    pub endpoint: String,
    pub profile: String,
    pub api_key: String,
}

impl OrsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Read `ORS_API_KEY` (required) and `ORS_ENDPOINT` (optional).
    pub fn from_env() -> Result<Self, RoutingError> {
        let api_key = std::env::var("ORS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(RoutingError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Ok(endpoint) = std::env::var("ORS_ENDPOINT") {
            config.endpoint = endpoint;
        }
        Ok(config)
    }
}

/// Blocking HTTP client for the `/v2/directions/{profile}/geojson` endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouteService {
    client: Client,
    config: OrsConfig,
}

impl OpenRouteService {
    pub fn new(mut config: OrsConfig) -> Result<Self, RoutingError> {
        if config.api_key.trim().is_empty() {
            return Err(RoutingError::MissingApiKey);
        }
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.endpoint, self.config.profile
        )
    }
}

impl RoutingProvider for OpenRouteService {
    fn route(
        &self,
        origin: GpsPoint,
        destination: GpsPoint,
    ) -> Result<RouteResponse, RoutingError> {
        let body = DirectionsRequest {
            coordinates: [
                [origin.longitude, origin.latitude],
                [destination.longitude, destination.latitude],
            ],
            units: "m",
            geometry: true,
            geometry_simplify: false,
            instructions: false,
            elevation: false,
        };

        debug!(
            "[RideMatch] Requesting {} route ({:.5},{:.5}) -> ({:.5},{:.5})",
            self.config.profile,
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude
        );

        let response = self
            .client
            .post(self.url())
            .header("Authorization", &self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().unwrap_or_default();
            return Err(RoutingError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text()?;
        parse_directions(&text)
    }
}

#[derive(Serialize)]
struct DirectionsRequest {
    coordinates: [[f64; 2]; 2],
    units: &'static str,
    geometry: bool,
    geometry_simplify: bool,
    instructions: bool,
    elevation: bool,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: LineString,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Deserialize)]
struct LineString {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct Properties {
    summary: Option<Summary>,
}

#[derive(Deserialize)]
struct Summary {
    distance: Option<f64>,
    duration: Option<f64>,
}

/// Turn a GeoJSON directions body into a route. Positions arrive as
/// `[lon, lat]` (with an optional elevation).
pub(crate) fn parse_directions(body: &str) -> Result<RouteResponse, RoutingError> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(RoutingError::EmptyRoute)?;

    let route = feature
        .geometry
        .coordinates
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => {
                let point = GpsPoint::new(*lat, *lon);
                if point.is_valid() {
                    Ok(point)
                } else {
                    Err(RoutingError::InvalidResponse(format!(
                        "position [{}, {}] out of range",
                        lon, lat
                    )))
                }
            }
            _ => Err(RoutingError::InvalidResponse(format!(
                "position with {} values",
                position.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if route.is_empty() {
        return Err(RoutingError::EmptyRoute);
    }

    let summary = feature.properties.and_then(|p| p.summary);
    let distance = summary.as_ref().and_then(|s| s.distance);
    let duration = summary.as_ref().and_then(|s| s.duration);

    Ok(RouteResponse::new(route, distance, duration))
}
