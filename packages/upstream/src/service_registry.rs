//! Compile-time registry of upstream provider configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The registry
//! embeds these at compile time and exposes them via [`all_services`] and
//! [`find`].

use serde::Deserialize;

/// An upstream service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamService {
    /// Unique identifier (e.g., `"overpass"`, `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Overpass road-network query service.
    Overpass {
        /// Interpreter endpoint.
        base_url: String,
        /// Server-side `[timeout:N]` placed in the query.
        query_timeout_secs: u32,
        /// Tag key every queried Way must carry.
        highway_tag: String,
    },
    /// `OpenRouteService` directions.
    OpenRouteService {
        /// Directions endpoint without the profile segment.
        base_url: String,
        /// Routing profile (e.g., `"cycling-road"`).
        profile: String,
        /// Environment variable holding the API key.
        api_key_env: String,
        /// Per-request timeout.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Nominatim search.
    Nominatim {
        /// Search endpoint.
        base_url: String,
        /// `accept-language` parameter.
        accept_language: String,
        /// Maximum candidates per query.
        limit: u32,
        /// Per-request timeout.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// ODPT bus stop poles.
    Odpt {
        /// `odpt:BusstopPole` endpoint.
        base_url: String,
        /// `odpt:operator` filter.
        operator: String,
    },
    /// Tokyo Metropolitan open-data API.
    TokyoOpenData {
        /// Dataset endpoint.
        base_url: String,
        /// Page size.
        limit: u32,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout() -> u64 {
    10
}

impl UpstreamService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Overpass { base_url, .. }
            | ProviderConfig::OpenRouteService { base_url, .. }
            | ProviderConfig::Nominatim { base_url, .. }
            | ProviderConfig::Odpt { base_url, .. }
            | ProviderConfig::TokyoOpenData { base_url, .. } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("overpass", include_str!("../services/overpass.toml")),
    (
        "openrouteservice",
        include_str!("../services/openrouteservice.toml"),
    ),
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("odpt", include_str!("../services/odpt.toml")),
    (
        "tokyo_open_data",
        include_str!("../services/tokyo_open_data.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 5;

/// Returns all service configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<UpstreamService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse upstream service '{name}': {e}"))
        })
        .collect()
}

/// Looks up an enabled service by id.
#[must_use]
pub fn find(id: &str) -> Option<UpstreamService> {
    all_services()
        .into_iter()
        .find(|s| s.enabled && s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for svc in &all_services() {
            assert!(seen.insert(svc.id.clone()), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_base_urls() {
        for svc in &all_services() {
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                svc.base_url().starts_with("https://"),
                "Service {} has non-https base_url",
                svc.id
            );
        }
    }

    #[test]
    fn online_providers_use_ten_second_timeout() {
        for id in ["openrouteservice", "nominatim"] {
            let svc = find(id).unwrap();
            match svc.provider {
                ProviderConfig::OpenRouteService { timeout_secs, .. }
                | ProviderConfig::Nominatim { timeout_secs, .. } => assert_eq!(timeout_secs, 10),
                other => panic!("unexpected provider for {id}: {other:?}"),
            }
        }
    }
}
