//! Nominatim / `OpenStreetMap` search client.
//!
//! Used for the destination-search passthrough, for bicycle-parking
//! lookups along a route, and for geocoding enforcement intersections
//! offline. The public instance allows about one request per second.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use charimachi_geometry::{BoundingBox, Coordinate};
use serde::{Deserialize, Serialize};

use crate::service_registry::{self, ProviderConfig};
use crate::{ConfigError, UpstreamError, http};

const SERVICE: &str = "nominatim";

/// One ranked search candidate, as returned by Nominatim with
/// `format=json`. Latitude and longitude are strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Nominatim-internal place id.
    #[serde(default)]
    pub place_id: i64,
    /// Data licence notice.
    #[serde(default)]
    pub licence: String,
    /// OSM element kind (`node`, `way`, `relation`).
    #[serde(default)]
    pub osm_type: String,
    /// OSM element id.
    #[serde(default)]
    pub osm_id: i64,
    /// Latitude as a decimal string.
    pub lat: String,
    /// Longitude as a decimal string.
    pub lon: String,
    /// Main category (`amenity`, `railway`, ...).
    #[serde(default)]
    pub class: String,
    /// Sub-category (`bicycle_parking`, `station`, ...).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Granularity rank.
    #[serde(default)]
    pub place_rank: i32,
    /// Relevance score.
    #[serde(default)]
    pub importance: f64,
    /// Address kind.
    #[serde(default)]
    pub addresstype: String,
    /// OSM `name`.
    #[serde(default)]
    pub name: String,
    /// Full display name.
    #[serde(default)]
    pub display_name: String,
    /// `[south, north, west, east]` as strings.
    #[serde(default)]
    pub boundingbox: Vec<String>,
}

impl SearchCandidate {
    /// Parsed `[lon, lat]` position, if both strings are numeric.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lon = self.lon.trim().parse().ok()?;
        let lat = self.lat.trim().parse().ok()?;
        Some(Coordinate::new(lon, lat))
    }
}

/// Client for the Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    accept_language: String,
    limit: u32,
}

impl NominatimClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        accept_language: &str,
        limit: u32,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.to_string(),
            accept_language: accept_language.to_string(),
            limit,
        })
    }

    /// Creates a client from the embedded `nominatim` service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the definition is missing or the HTTP
    /// client cannot be built.
    pub fn from_registry() -> Result<Self, ConfigError> {
        match service_registry::find(SERVICE).map(|s| s.provider) {
            Some(ProviderConfig::Nominatim {
                base_url,
                accept_language,
                limit,
                timeout_secs,
            }) => Self::new(
                &base_url,
                &accept_language,
                limit,
                Some(Duration::from_secs(timeout_secs)),
            ),
            _ => Err(ConfigError::MissingService { id: SERVICE }),
        }
    }

    /// Free-text search.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, UpstreamError> {
        let limit = self.limit.to_string();
        http::send_json(
            SERVICE,
            self.client.get(&self.base_url).query(&[
                ("q", query),
                ("accept-language", self.accept_language.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ]),
        )
        .await
    }

    /// Search restricted to `viewbox` (`bounded=1`).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn search_within(
        &self,
        query: &str,
        viewbox: &BoundingBox,
    ) -> Result<Vec<SearchCandidate>, UpstreamError> {
        let limit = self.limit.to_string();
        let viewbox = format_viewbox(viewbox);
        http::send_json(
            SERVICE,
            self.client.get(&self.base_url).query(&[
                ("q", query),
                ("viewbox", viewbox.as_str()),
                ("bounded", "1"),
                ("accept-language", self.accept_language.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ]),
        )
        .await
    }
}

/// `viewbox=<x1>,<y1>,<x2>,<y2>` as Nominatim expects it.
fn format_viewbox(bbox: &BoundingBox) -> String {
    format!("{},{},{},{}", bbox.west, bbox.south, bbox.east, bbox.north)
}
