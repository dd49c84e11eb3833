//! External services the planner depends on.

use async_trait::async_trait;
use charimachi_geometry::{BoundingBox, Coordinate};
use charimachi_upstream::UpstreamError;
use charimachi_upstream::nominatim::{NominatimClient, SearchCandidate};
use charimachi_upstream::openrouteservice::{OpenRouteServiceClient, RouteResponse};

/// Query that makes Nominatim return bicycle parking facilities.
pub const BIKE_PARKING_QUERY: &str = "[bicycle_parking]";

/// Half-size, in degrees, of the box searched for bicycle parking.
pub const BIKE_PARKING_SEARCH_RADIUS_DEG: f64 = 0.011;

/// Computes bicycle routes.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Route from `start` to `end`, avoiding every polygon in `avoid`
    /// (closed exterior rings). An empty `avoid` means no constraint.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the provider fails.
    async fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        avoid: &[Vec<Coordinate>],
    ) -> Result<RouteResponse, UpstreamError>;
}

/// Searches places.
#[async_trait]
pub trait PoiSearch: Send + Sync {
    /// Free-text place search.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the provider fails.
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, UpstreamError>;

    /// Nearest bicycle parking around `at`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the provider fails.
    async fn bike_parking_near(&self, at: Coordinate) -> Result<Option<Coordinate>, UpstreamError>;
}

#[async_trait]
impl RoutingProvider for OpenRouteServiceClient {
    async fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        avoid: &[Vec<Coordinate>],
    ) -> Result<RouteResponse, UpstreamError> {
        if avoid.is_empty() {
            self.directions(start, end).await
        } else {
            self.directions_avoiding(start, end, avoid).await
        }
    }
}

#[async_trait]
impl PoiSearch for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, UpstreamError> {
        Self::search(self, query).await
    }

    async fn bike_parking_near(&self, at: Coordinate) -> Result<Option<Coordinate>, UpstreamError> {
        let viewbox = BoundingBox::around(at, BIKE_PARKING_SEARCH_RADIUS_DEG);
        let candidates = self.search_within(BIKE_PARKING_QUERY, &viewbox).await?;
        Ok(candidates.iter().find_map(SearchCandidate::coordinate))
    }
}
