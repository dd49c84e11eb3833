//! ODPT (Open Data for Public Transportation) bus stop pole client.
//!
//! See <https://developer.odpt.org/>

use charimachi_geometry::Coordinate;
use serde::Deserialize;

use crate::service_registry::{self, ProviderConfig};
use crate::{ConfigError, UpstreamError, http};

const SERVICE: &str = "odpt";

/// A bus stop pole as published by ODPT (JSON-LD field names).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BusstopPole {
    /// JSON-LD `@id` (URN).
    #[serde(rename = "@id", default)]
    pub id: String,
    /// Localised titles.
    #[serde(default)]
    pub title: LocalizedTitle,
    /// `dc:title`, usually the Japanese name.
    #[serde(rename = "dc:title", default)]
    pub dc_title: String,
    /// Latitude; `0.0` when the feed omits it.
    #[serde(rename = "geo:lat", default)]
    pub lat: f64,
    /// Longitude; `0.0` when the feed omits it.
    #[serde(rename = "geo:long", default)]
    pub long: f64,
    /// Stable ODPT identifier (`odpt.BusstopPole:...`).
    #[serde(rename = "owl:sameAs", default)]
    pub same_as: String,
}

/// Multilingual title block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocalizedTitle {
    /// English.
    #[serde(default)]
    pub en: String,
    /// Japanese.
    #[serde(default)]
    pub ja: String,
}

impl BusstopPole {
    /// Position, or `None` when the feed leaves either axis at zero.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        (self.lat.abs() > f64::EPSILON && self.long.abs() > f64::EPSILON)
            .then(|| Coordinate::new(self.long, self.lat))
    }

    /// Preferred identifier: `owl:sameAs`, falling back to `@id`.
    #[must_use]
    pub fn preferred_id(&self) -> &str {
        if self.same_as.is_empty() {
            &self.id
        } else {
            &self.same_as
        }
    }

    /// Preferred display name: Japanese title, then `dc:title`, then English.
    #[must_use]
    pub fn preferred_name(&self) -> &str {
        [
            self.title.ja.as_str(),
            self.dc_title.as_str(),
            self.title.en.as_str(),
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
    }
}

/// Client for the `odpt:BusstopPole` endpoint.
#[derive(Debug, Clone)]
pub struct OdptClient {
    client: reqwest::Client,
    base_url: String,
    operator: String,
}

impl OdptClient {
    /// Creates a client from the embedded `odpt` service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the definition is missing or the HTTP
    /// client cannot be built.
    pub fn from_registry() -> Result<Self, ConfigError> {
        match service_registry::find(SERVICE).map(|s| s.provider) {
            Some(ProviderConfig::Odpt { base_url, operator }) => Ok(Self {
                client: http::build_client(None)?,
                base_url,
                operator,
            }),
            _ => Err(ConfigError::MissingService { id: SERVICE }),
        }
    }

    /// Fetches every bus stop pole of the configured operator.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn fetch_bus_stop_poles(&self) -> Result<Vec<BusstopPole>, UpstreamError> {
        http::send_json(
            SERVICE,
            self.client
                .get(&self.base_url)
                .query(&[("odpt:operator", self.operator.as_str())]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_ld_fields() {
        let body = r#"[{
            "@id": "urn:ucode:_00001C000000000000010000030E0E3E",
            "@type": "odpt:BusstopPole",
            "title": {"en": "Shimbashi Station", "ja": "新橋駅前", "ja-Hrkt": "しんばしえきまえ"},
            "dc:date": "2024-01-01T00:00:00+09:00",
            "geo:lat": 35.666,
            "geo:long": 139.758,
            "dc:title": "新橋駅前",
            "owl:sameAs": "odpt.BusstopPole:Toei.Shimbashieki.123.1"
        }]"#;
        let poles: Vec<BusstopPole> = http::decode(SERVICE, body).unwrap();
        assert_eq!(poles[0].preferred_id(), "odpt.BusstopPole:Toei.Shimbashieki.123.1");
        assert_eq!(poles[0].preferred_name(), "新橋駅前");
        assert_eq!(poles[0].coordinate(), Some(Coordinate::new(139.758, 35.666)));
    }

    #[test]
    fn falls_back_through_ids_and_names() {
        let pole = BusstopPole {
            id: "urn:x".to_string(),
            title: LocalizedTitle {
                en: "Stop".to_string(),
                ja: String::new(),
            },
            ..BusstopPole::default()
        };
        assert_eq!(pole.preferred_id(), "urn:x");
        assert_eq!(pole.preferred_name(), "Stop");
        assert!(pole.coordinate().is_none());
    }
}
