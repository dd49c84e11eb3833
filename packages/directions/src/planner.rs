//! Route requests with optional bike-parking stops.
//!
//! With `via_bike_parking`, the planner walks the route accumulating
//! great-circle distance. Every time the running total passes
//! [`BIKE_PARKING_INTERVAL_M`] it looks for bicycle parking near the
//! current vertex and resets the total. When parking is found, the route
//! is rerouted through it: the leg to the parking is spliced in and the
//! walk continues on a fresh route from the parking to the destination.
//! At most [`MAX_BIKE_PARKING_STOPS`] stops are inserted.
//!
//! Stop insertion is best-effort. A failed parking search or detour leg is
//! logged and the original route is kept from that point on.

use charimachi_geometry::{Coordinate, haversine_distance_m};
use charimachi_upstream::openrouteservice::RouteResponse;

use crate::DirectionsError;
use crate::providers::{PoiSearch, RoutingProvider};

/// Distance ridden between parking searches, in meters.
pub const BIKE_PARKING_INTERVAL_M: f64 = 500.0;

/// Upper bound on inserted parking stops per route.
pub const MAX_BIKE_PARKING_STOPS: usize = 8;

/// Comfort score with no options enabled.
pub const BASE_COMFORT_SCORE: u8 = 49;

/// User-selected route preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Stop at bicycle parking along the way.
    pub via_bike_parking: bool,
    /// Route around bus stops.
    pub avoid_bus_stops: bool,
    /// Prefer fewer traffic lights. Only affects the comfort score.
    pub avoid_traffic_lights: bool,
}

impl RouteOptions {
    /// Number of enabled options.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        [
            self.via_bike_parking,
            self.avoid_bus_stops,
            self.avoid_traffic_lights,
        ]
        .into_iter()
        .filter(|&enabled| enabled)
        .count()
    }
}

/// Rough 0-100 comfort rating of a route from the options used.
#[must_use]
pub fn comfort_score(options: &RouteOptions) -> u8 {
    match options.enabled_count() {
        0 => BASE_COMFORT_SCORE,
        1 => 79,
        2 => 89,
        _ => 100,
    }
}

/// Requests a route and, if asked, inserts bike-parking stops into its
/// geometry. `avoid` polygons apply to every leg.
///
/// # Errors
///
/// Returns [`DirectionsError`] if the initial route request fails or
/// carries no geometry.
pub async fn plan_route(
    routing: &dyn RoutingProvider,
    poi: &dyn PoiSearch,
    start: Coordinate,
    end: Coordinate,
    options: &RouteOptions,
    avoid: &[Vec<Coordinate>],
) -> Result<RouteResponse, DirectionsError> {
    let mut response = routing.route(start, end, avoid).await?;
    let geometry = response
        .geometry_mut()
        .ok_or(DirectionsError::EmptyRoute)?;

    log::debug!(
        "Route {start:?} -> {end:?}: {} point(s), {} avoid polygon(s)",
        geometry.coordinates.len(),
        avoid.len()
    );

    if options.via_bike_parking {
        let original = std::mem::take(&mut geometry.coordinates);
        geometry.coordinates = insert_bike_parking(routing, poi, original, end, avoid).await;
    }

    Ok(response)
}

/// Walks `route` and splices in detours through bicycle parking.
pub async fn insert_bike_parking(
    routing: &dyn RoutingProvider,
    poi: &dyn PoiSearch,
    route: Vec<Coordinate>,
    end: Coordinate,
    avoid: &[Vec<Coordinate>],
) -> Vec<Coordinate> {
    let mut output = Vec::with_capacity(route.len());
    let mut remaining = route;
    let mut accumulated = 0.0;
    let mut stops = 0;
    let mut i = 0;

    while i < remaining.len() {
        let current = remaining[i];
        if i > 0 {
            accumulated += haversine_distance_m(remaining[i - 1], current);
        }
        push_point(&mut output, current);

        let is_last = i + 1 == remaining.len();
        if accumulated > BIKE_PARKING_INTERVAL_M && !is_last && stops < MAX_BIKE_PARKING_STOPS {
            accumulated = 0.0;
            if let Some(rest) = detour(routing, poi, current, end, avoid, &mut output).await {
                stops += 1;
                remaining = rest;
                i = 0;
                continue;
            }
        }
        i += 1;
    }

    log::debug!("{stops} bike-parking stop(s) inserted");
    output
}

/// Routes `current -> parking -> end`. On success the first leg is
/// appended to `output` and the second leg's geometry is returned.
async fn detour(
    routing: &dyn RoutingProvider,
    poi: &dyn PoiSearch,
    current: Coordinate,
    end: Coordinate,
    avoid: &[Vec<Coordinate>],
    output: &mut Vec<Coordinate>,
) -> Option<Vec<Coordinate>> {
    let parking = match poi.bike_parking_near(current).await {
        Ok(Some(parking)) => parking,
        Ok(None) => {
            log::debug!("No bike parking near {current:?}");
            return None;
        }
        Err(e) => {
            log::warn!("Bike parking search near {current:?} failed: {e}");
            return None;
        }
    };

    let legs = futures::try_join!(
        routing.route(current, parking, avoid),
        routing.route(parking, end, avoid),
    );
    let (to_parking, from_parking) = match legs {
        Ok(legs) => legs,
        Err(e) => {
            log::warn!("Detour via bike parking at {parking:?} failed: {e}");
            return None;
        }
    };

    let (Some(to_parking), Some(from_parking)) = (to_parking.geometry(), from_parking.geometry())
    else {
        log::warn!("Detour via bike parking at {parking:?} returned no geometry");
        return None;
    };

    log::debug!("Bike parking stop at {parking:?}");
    for &c in &to_parking.coordinates {
        push_point(output, c);
    }
    Some(from_parking.coordinates.clone())
}

/// Appends `c` unless it repeats the last point.
fn push_point(output: &mut Vec<Coordinate>, c: Coordinate) {
    if output.last() != Some(&c) {
        output.push(c);
    }
}
