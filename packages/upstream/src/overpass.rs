//! Overpass API client for fetching named road polylines.
//!
//! One request per road name: `way["highway"]["name"="<name>"](bbox)` with
//! `out geom`, which inlines each Way's node coordinates so no second
//! lookup is needed.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use charimachi_geometry::{BoundingBox, Coordinate};
use serde::{Deserialize, Serialize};

use crate::service_registry::{self, ProviderConfig};
use crate::{ConfigError, UpstreamError, http};

const SERVICE: &str = "overpass";

/// One contiguous piece of a named road.
///
/// A single road is usually split into many Ways by the upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    /// OSM way id.
    pub id: i64,
    /// Display name (the `name` tag).
    pub name: String,
    /// Ordered node coordinates.
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    geometry: Vec<OverpassPoint>,
    #[serde(default)]
    tags: OverpassTags,
}

#[derive(Debug, Deserialize)]
struct OverpassPoint {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OverpassTags {
    #[serde(default)]
    name: String,
}

/// Thin client for the Overpass interpreter endpoint.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    base_url: String,
    query_timeout_secs: u32,
    highway_tag: String,
}

impl OverpassClient {
    /// Creates a client for the given interpreter endpoint.
    ///
    /// No client-side timeout is applied; the server-side `[timeout:N]`
    /// bounds the query instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        query_timeout_secs: u32,
        highway_tag: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(None)?,
            base_url: base_url.to_string(),
            query_timeout_secs,
            highway_tag: highway_tag.to_string(),
        })
    }

    /// Creates a client from the embedded `overpass` service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the definition is missing or the HTTP
    /// client cannot be built.
    pub fn from_registry() -> Result<Self, ConfigError> {
        match service_registry::find(SERVICE).map(|s| s.provider) {
            Some(ProviderConfig::Overpass {
                base_url,
                query_timeout_secs,
                highway_tag,
            }) => Self::new(&base_url, query_timeout_secs, &highway_tag),
            _ => Err(ConfigError::MissingService { id: SERVICE }),
        }
    }

    /// Fetches every Way carrying `road_name` inside `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure,
    /// and [`UpstreamError::NoWays`] if the query matched nothing.
    pub async fn fetch_ways(
        &self,
        road_name: &str,
        bbox: &BoundingBox,
    ) -> Result<Vec<Way>, UpstreamError> {
        let query = build_query(road_name, bbox, self.query_timeout_secs, &self.highway_tag);
        log::debug!("Overpass query for '{road_name}':\n{query}");

        let body: OverpassResponse = http::send_json(
            SERVICE,
            self.client
                .post(&self.base_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .form(&[("data", query.as_str())]),
        )
        .await?;

        let ways = into_ways(body);
        log::debug!(
            "Overpass returned {} way(s) for '{road_name}' ({} points)",
            ways.len(),
            ways.iter().map(|w| w.coordinates.len()).sum::<usize>()
        );

        if ways.is_empty() {
            return Err(UpstreamError::NoWays {
                road: road_name.to_string(),
            });
        }
        Ok(ways)
    }
}

/// Builds the Overpass QL query. The bbox is written `(south,west,north,east)`
/// at two decimals.
#[must_use]
pub fn build_query(
    road_name: &str,
    bbox: &BoundingBox,
    timeout_secs: u32,
    highway_tag: &str,
) -> String {
    format!(
        "[out:json][timeout:{timeout_secs}];\nway[\"{tag}\"][\"name\"=\"{name}\"]({s:.2},{w:.2},{n:.2},{e:.2});\nout geom;\n",
        tag = escape(highway_tag),
        name = escape(road_name),
        s = bbox.south,
        w = bbox.west,
        n = bbox.north,
        e = bbox.east,
    )
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn into_ways(body: OverpassResponse) -> Vec<Way> {
    body.elements
        .into_iter()
        .filter(|e| e.kind == "way" && !e.geometry.is_empty())
        .map(|e| Way {
            id: e.id,
            name: e.tags.name,
            coordinates: e
                .geometry
                .into_iter()
                .map(|p| Coordinate::new(p.lon, p.lat))
                .collect(),
        })
        .collect()
}
