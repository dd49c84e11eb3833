#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP clients for the third-party providers the backend aggregates.
//!
//! Each provider is configured through a TOML file under `services/`,
//! embedded at compile time by the [`service_registry`]:
//!
//! 1. **Overpass**: road polylines by exact name within a bounding box.
//! 2. **`OpenRouteService`**: cycling directions as `GeoJSON`.
//! 3. **Nominatim**: free-text place search.
//! 4. **ODPT**: Toei bus stop poles.
//! 5. **Tokyo open data**: enforcement-intensive intersections.
//!
//! No client retries. A failed call is reported once as an
//! [`UpstreamError`] and the caller decides whether to abort or skip.

pub mod http;
pub mod nominatim;
pub mod odpt;
pub mod openrouteservice;
pub mod overpass;
pub mod service_registry;
pub mod tokyo_open_data;

use thiserror::Error;

/// `User-Agent` sent with every outbound request. Nominatim and Overpass
/// both reject anonymous clients.
pub const USER_AGENT: &str = concat!("charimachi/", env!("CARGO_PKG_VERSION"));

/// Errors from calls to an upstream provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure (connection, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{service} returned status {status}: {message}")]
    Status {
        /// Provider identifier.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("{service} response could not be parsed: {message}")]
    Parse {
        /// Provider identifier.
        service: &'static str,
        /// Description of the parsing failure.
        message: String,
    },

    /// The road-network service has no Way with this name in the bbox.
    #[error("no ways named '{road}' in the requested bounding box")]
    NoWays {
        /// The road name that was queried.
        road: String,
    },
}

/// Errors raised while building a client from its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential environment variable is unset or empty.
    #[error("{var} is not set")]
    MissingCredential {
        /// Name of the environment variable.
        var: String,
    },

    /// No embedded service definition matches the requested provider.
    #[error("no service configuration for '{id}'")]
    MissingService {
        /// The provider identifier that was looked up.
        id: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
