//! Routing provider seam.
//!
//! Trips reach the engine with their route already computed. A
//! [`RoutingProvider`] turns an origin and destination into that route; the
//! engine itself never calls one.

#[cfg(feature = "http")]
pub mod openrouteservice;

#[cfg(feature = "http")]
pub use openrouteservice::{OpenRouteService, OrsConfig};

use crate::error::RoutingError;
use crate::{GpsPoint, Role, Trip, polyline};

/// A computed driving route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub route: Vec<GpsPoint>,
    /// The route in compact polyline form, as the trip store holds it.
    pub encoded: String,
    pub distance_meters: Option<f64>,
    pub duration_secs: Option<f64>,
}

impl RouteResponse {
    /// Build a response from a decoded route, encoding it for storage.
    pub fn new(
        route: Vec<GpsPoint>,
        distance_meters: Option<f64>,
        duration_secs: Option<f64>,
    ) -> Self {
        let encoded = polyline::encode(&route);
        Self {
            route,
            encoded,
            distance_meters,
            duration_secs,
        }
    }

    /// Distance for display, e.g. "12.3 km".
    pub fn distance_label(&self) -> String {
        match self.distance_meters {
            Some(meters) => format!("{:.1} km", meters / 1000.0),
            None => "Unknown".to_string(),
        }
    }

    /// Duration for display, e.g. "15 min".
    pub fn duration_label(&self) -> String {
        match self.duration_secs {
            Some(secs) => format!("{} min", (secs / 60.0).round() as i64),
            None => "Unknown".to_string(),
        }
    }
}

/// Source of road routes between two points.
pub trait RoutingProvider: Send + Sync {
    fn route(&self, origin: GpsPoint, destination: GpsPoint) -> Result<RouteResponse, RoutingError>;
}

/// Fetch a route and build an active trip from it.
///
/// The trip keeps the requested origin and destination rather than the
/// snapped route endpoints.
pub fn plan_trip<P>(
    provider: &P,
    id: impl Into<String>,
    role: Role,
    origin: GpsPoint,
    destination: GpsPoint,
    scheduled_at: i64,
) -> Result<(Trip, RouteResponse), RoutingError>
where
    P: RoutingProvider + ?Sized,
{
    let response = provider.route(origin, destination)?;
    if response.route.is_empty() {
        return Err(RoutingError::EmptyRoute);
    }

    let mut trip = Trip::new(id, role, response.route.clone(), scheduled_at);
    trip.origin = origin;
    trip.destination = destination;
    Ok((trip, response))
}
