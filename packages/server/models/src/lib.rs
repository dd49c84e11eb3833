#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the charimachi server.
//!
//! Field names follow the mobile client's contract (`snake_case`), which
//! differs from the upstream providers' own payloads in places.

use charimachi_upstream::openrouteservice::RouteResponse;
use charimachi_violation_models::{ViolationAnnotation, WarningPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// Server time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Service name.
    pub service: String,
    /// Server version.
    pub version: String,
}

/// Query parameters for `GET /directions/bicycle`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsParams {
    /// Origin as `lon,lat`.
    pub start: Option<String>,
    /// Destination as `lon,lat`.
    pub end: Option<String>,
    /// Stop at bicycle parking along the way.
    #[serde(default, deserialize_with = "query_flag")]
    pub via_bike_parking: bool,
    /// Route around bus stops.
    #[serde(default, deserialize_with = "query_flag")]
    pub avoid_bus_stops: bool,
    /// Prefer fewer traffic lights.
    #[serde(default, deserialize_with = "query_flag")]
    pub avoid_traffic_lights: bool,
}

/// A query flag is set only by the literal `true`; any other value,
/// including a malformed one, leaves it off.
fn query_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(value == "true")
}

/// The provider's `GeoJSON` route plus the server's overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsResponse {
    /// Upstream `FeatureCollection`, passed through.
    #[serde(flatten)]
    pub route: RouteResponse,
    /// Warning points lying on the route.
    pub warning_points: Vec<WarningPoint>,
    /// 0-100 comfort rating.
    pub comfort_score: u8,
    /// Id for follow-up requests about this route.
    pub session_id: String,
}

/// Query parameters for `GET /search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query.
    pub q: Option<String>,
}

/// Query parameters for `GET /violation_rates`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViolationRatesParams {
    /// Session id from a directions response.
    pub session_id: Option<String>,
}

/// Violation overlay for a route. `null` when the session is unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationRatesResponse {
    /// Violation records on the route.
    pub violation_rates: Option<Vec<ViolationAnnotation>>,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// The error.
    pub error: ApiErrorDetail,
}

/// Error code and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// HTTP status code.
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}
