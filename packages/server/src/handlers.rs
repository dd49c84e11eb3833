//! HTTP handler functions for the charimachi API.

use std::sync::PoisonError;

use actix_web::{HttpResponse, web};
use charimachi_directions::planner::{RouteOptions, comfort_score, plan_route};
use charimachi_directions::session::new_session_id;
use charimachi_geometry::Coordinate;
use charimachi_server_models::{
    ApiHealth, DirectionsParams, DirectionsResponse, SearchParams, ViolationRatesParams,
    ViolationRatesResponse,
};
use charimachi_violation::proximity::{filter_violations, warning_points_on_route};

use crate::AppState;
use crate::error::ApiError;

/// `GET /api/v1/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/v1/directions/bicycle`
///
/// Plans a bicycle route, overlays the warning points lying on it and
/// stores its geometry under a fresh session id for `/violation_rates`.
///
/// # Errors
///
/// * [`ApiError::Validation`] if `start` or `end` is missing or malformed
/// * [`ApiError::Config`] if no routing provider is configured
/// * [`ApiError::Upstream`] / [`ApiError::NotFound`] if routing fails
pub async fn directions(
    state: web::Data<AppState>,
    params: web::Query<DirectionsParams>,
) -> Result<HttpResponse, ApiError> {
    let start = parse_coordinate("start", params.start.as_deref())?;
    let end = parse_coordinate("end", params.end.as_deref())?;
    let routing = state
        .routing
        .as_deref()
        .ok_or_else(|| ApiError::Config("OPEN_ROUTE_SERVICE_API_KEY is not set".to_string()))?;

    let options = RouteOptions {
        via_bike_parking: params.via_bike_parking,
        avoid_bus_stops: params.avoid_bus_stops,
        avoid_traffic_lights: params.avoid_traffic_lights,
    };
    let avoid: Vec<Vec<Coordinate>> = if options.avoid_bus_stops {
        state
            .bus_stops
            .iter()
            .filter(|stop| stop.polygon.len() >= 4)
            .map(|stop| stop.polygon.clone())
            .collect()
    } else {
        Vec::new()
    };

    let route = plan_route(routing, state.poi.as_ref(), start, end, &options, &avoid).await?;
    let coordinates = route
        .geometry()
        .map(|g| g.coordinates.clone())
        .unwrap_or_default();

    let warning_points = warning_points_on_route(&coordinates, &state.warning_points);
    let session_id = new_session_id();
    log::info!(
        "Planned route {session_id}: {} point(s), {} warning point(s)",
        coordinates.len(),
        warning_points.len()
    );
    state.sessions.put(&session_id, coordinates);

    Ok(HttpResponse::Ok().json(DirectionsResponse {
        route,
        warning_points,
        comfort_score: comfort_score(&options),
        session_id,
    }))
}

/// `GET /api/v1/search`
///
/// Passes the query through to the place search provider.
///
/// # Errors
///
/// * [`ApiError::Validation`] if `q` is missing or blank
/// * [`ApiError::Upstream`] if the provider fails
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("q is required".to_string()))?;

    let candidates = state.poi.search(query).await?;
    Ok(HttpResponse::Ok().json(candidates))
}

/// `GET /api/v1/warningPoint`
pub async fn warning_points(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.warning_points)
}

/// `GET /api/v1/violation_rates`
///
/// Violation records along the route stored under `session_id`. An
/// unknown, expired or missing session yields `{"violation_rates": null}`.
pub async fn violation_rates(
    state: web::Data<AppState>,
    params: web::Query<ViolationRatesParams>,
) -> HttpResponse {
    let route = params
        .session_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| state.sessions.get(id));

    let Some(route) = route else {
        return HttpResponse::Ok().json(ViolationRatesResponse::default());
    };

    let annotations = {
        let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
        filter_violations(&route, &state.violations, &mut *rng)
    };

    HttpResponse::Ok().json(ViolationRatesResponse {
        violation_rates: Some(annotations),
    })
}

fn parse_coordinate(name: &str, value: Option<&str>) -> Result<Coordinate, ApiError> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{name} is required")))?;
    value
        .parse()
        .map_err(|e| ApiError::Validation(format!("{name}: {e}")))
}
