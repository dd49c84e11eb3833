//! `OpenRouteService` directions client.
//!
//! Plain routes use the `GET /v2/directions/{profile}` form with the key in
//! the query string. Routes that must avoid areas (bus stops) use
//! `POST /v2/directions/{profile}/geojson` with an `avoid_polygons`
//! `MultiPolygon` and the key in the `Authorization` header.
//!
//! See <https://openrouteservice.org/dev/#/api-docs/v2/directions>

use std::time::Duration;

use charimachi_geometry::Coordinate;
use serde::{Deserialize, Serialize};

use crate::service_registry::{self, ProviderConfig};
use crate::{ConfigError, UpstreamError, http};

const SERVICE: &str = "openrouteservice";

/// `GeoJSON` `FeatureCollection` returned by the directions endpoint.
///
/// Only the route geometry is typed; everything else is passed through to
/// clients untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Route bounding box `[minLon, minLat, maxLon, maxLat]`.
    #[serde(default)]
    pub bbox: Vec<f64>,
    /// Route features; the first one carries the route geometry.
    pub features: Vec<RouteFeature>,
    /// Provider metadata (attribution, query echo, engine).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A single route feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeature {
    /// Feature bounding box.
    #[serde(default)]
    pub bbox: Vec<f64>,
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Segments, steps, summary and way points.
    #[serde(default)]
    pub properties: serde_json::Value,
    /// The route polyline.
    pub geometry: RouteGeometry,
}

/// `LineString` geometry of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    /// Always `"LineString"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordered `[lon, lat]` positions.
    pub coordinates: Vec<Coordinate>,
}

impl RouteResponse {
    /// Geometry of the first feature.
    #[must_use]
    pub fn geometry(&self) -> Option<&RouteGeometry> {
        self.features.first().map(|f| &f.geometry)
    }

    /// Mutable geometry of the first feature.
    pub fn geometry_mut(&mut self) -> Option<&mut RouteGeometry> {
        self.features.first_mut().map(|f| &mut f.geometry)
    }
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    coordinates: [Coordinate; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<RouteOptions<'a>>,
}

#[derive(Debug, Serialize)]
struct RouteOptions<'a> {
    avoid_polygons: AvoidPolygons<'a>,
}

#[derive(Debug, Serialize)]
struct AvoidPolygons<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<[&'a [Coordinate]; 1]>,
}

/// Client for the directions endpoint of one routing profile.
#[derive(Debug, Clone)]
pub struct OpenRouteServiceClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
    api_key: String,
}

impl OpenRouteServiceClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        profile: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(Some(timeout))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Creates a client from the embedded service definition, reading the
    /// API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the key is unset.
    pub fn from_registry() -> Result<Self, ConfigError> {
        let Some(ProviderConfig::OpenRouteService {
            base_url,
            profile,
            api_key_env,
            timeout_secs,
        }) = service_registry::find(SERVICE).map(|s| s.provider)
        else {
            return Err(ConfigError::MissingService { id: SERVICE });
        };

        let api_key = std::env::var(&api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential { var: api_key_env })?;

        Self::new(
            &base_url,
            &profile,
            &api_key,
            Duration::from_secs(timeout_secs),
        )
    }

    /// Requests a route from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteResponse, UpstreamError> {
        let url = format!("{}/{}", self.base_url, self.profile);
        log::debug!("ORS directions {start:?} -> {end:?}");

        http::send_json(
            SERVICE,
            self.client.get(url).query(&[
                ("api_key", self.api_key.as_str()),
                ("start", start.to_query_string().as_str()),
                ("end", end.to_query_string().as_str()),
            ]),
        )
        .await
    }

    /// Requests a route from `start` to `end` that avoids every polygon in
    /// `avoid` (each a closed exterior ring).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn directions_avoiding(
        &self,
        start: Coordinate,
        end: Coordinate,
        avoid: &[Vec<Coordinate>],
    ) -> Result<RouteResponse, UpstreamError> {
        let url = format!("{}/{}/geojson", self.base_url, self.profile);
        let body = avoid_request(start, end, avoid);
        log::debug!(
            "ORS directions {start:?} -> {end:?} avoiding {} polygon(s)",
            avoid.len()
        );

        http::send_json(
            SERVICE,
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, &self.api_key)
                .json(&body),
        )
        .await
    }
}

fn avoid_request(
    start: Coordinate,
    end: Coordinate,
    avoid: &[Vec<Coordinate>],
) -> RouteRequest<'_> {
    let coordinates: Vec<[&[Coordinate]; 1]> = avoid
        .iter()
        .filter(|ring| !ring.is_empty())
        .map(|ring| [ring.as_slice()])
        .collect();

    RouteRequest {
        coordinates: [start, end],
        options: (!coordinates.is_empty()).then_some(RouteOptions {
            avoid_polygons: AvoidPolygons {
                kind: "MultiPolygon",
                coordinates,
            },
        }),
    }
}
