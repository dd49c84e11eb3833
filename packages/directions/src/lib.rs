#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bicycle route planning on top of an external routing provider.
//!
//! * [`providers`]: the [`RoutingProvider`](providers::RoutingProvider) and
//!   [`PoiSearch`](providers::PoiSearch) seams, implemented for
//!   `OpenRouteService` and Nominatim.
//! * [`planner`]: route requests, bike-parking waypoint insertion and the
//!   comfort score.
//! * [`session`]: the short-lived store that remembers a route geometry
//!   under a session id.

pub mod planner;
pub mod providers;
pub mod session;

use charimachi_upstream::UpstreamError;

/// Errors from route planning.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// The routing provider failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The provider answered without a route geometry.
    #[error("routing provider returned no route")]
    EmptyRoute,
}
