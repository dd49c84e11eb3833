//! Tokyo Metropolitan Government open-data API client.
//!
//! Fetches the "enforcement-intensive intersections" dataset: locations
//! where the police run focused bicycle-violation enforcement, with the
//! reason for each.

use serde::{Deserialize, Serialize};

use crate::service_registry::{self, ProviderConfig};
use crate::{ConfigError, UpstreamError, http};

const SERVICE: &str = "tokyo_open_data";

/// One row of the enforcement dataset. Field names on the wire are
/// Japanese column headers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnforcementHit {
    /// Row number.
    #[serde(default)]
    pub row: u32,
    /// Ward (`行政区`).
    #[serde(rename = "行政区", default)]
    pub ward: String,
    /// Responsible police station (`所属`).
    #[serde(rename = "所属", default)]
    pub affiliation: String,
    /// Location, usually suffixed with `付近` (`実施場所`).
    #[serde(rename = "実施場所", default)]
    pub location: String,
    /// Intersection or route name (`交差点・路線名`).
    #[serde(rename = "交差点・路線名", default)]
    pub intersection: String,
    /// Enforcement reason (`取締理由`).
    #[serde(rename = "取締理由", default)]
    pub reason: String,
}

impl EnforcementHit {
    /// Location with the trailing "vicinity" marker removed, which
    /// otherwise derails geocoding.
    #[must_use]
    pub fn search_location(&self) -> String {
        self.location.replace("付近", "").trim().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct EnforcementResponse {
    #[serde(default)]
    hits: Vec<EnforcementHit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnforcementRequest {
    sort_order: Option<String>,
}

/// Client for the enforcement-intersection dataset.
#[derive(Debug, Clone)]
pub struct TokyoOpenDataClient {
    client: reqwest::Client,
    base_url: String,
    limit: u32,
}

impl TokyoOpenDataClient {
    /// Creates a client from the embedded `tokyo_open_data` definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the definition is missing or the HTTP
    /// client cannot be built.
    pub fn from_registry() -> Result<Self, ConfigError> {
        match service_registry::find(SERVICE).map(|s| s.provider) {
            Some(ProviderConfig::TokyoOpenData { base_url, limit }) => Ok(Self {
                client: http::build_client(None)?,
                base_url,
                limit,
            }),
            _ => Err(ConfigError::MissingService { id: SERVICE }),
        }
    }

    /// Fetches every enforcement row (single page of `limit` rows).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport, status, or decode failure.
    pub async fn fetch_enforcement_intersections(
        &self,
    ) -> Result<Vec<EnforcementHit>, UpstreamError> {
        let limit = self.limit.to_string();
        let body: EnforcementResponse = http::send_json(
            SERVICE,
            self.client
                .post(&self.base_url)
                .query(&[("limit", limit.as_str())])
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&EnforcementRequest { sort_order: None }),
        )
        .await?;
        Ok(body.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_japanese_column_names() {
        let body = r#"{
            "total": 1, "subtotal": 1, "limit": 1000, "offset": 0,
            "metadata": {"apiId": "x"},
            "hits": [{
                "row": 1,
                "行政区": "港区",
                "所属": "愛宕警察署",
                "実施場所": "新橋駅前交差点付近",
                "交差点・路線名": "新橋駅前",
                "取締理由": "信号無視が多発"
            }]
        }"#;
        let response: EnforcementResponse = http::decode(SERVICE, body).unwrap();
        let hit = &response.hits[0];
        assert_eq!(hit.ward, "港区");
        assert_eq!(hit.reason, "信号無視が多発");
        assert_eq!(hit.search_location(), "新橋駅前交差点");
    }

    #[test]
    fn request_body_sends_null_sort_order() {
        let json = serde_json::to_string(&EnforcementRequest { sort_order: None }).unwrap();
        assert_eq!(json, r#"{"sortOrder":null}"#);
    }
}
