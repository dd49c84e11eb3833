#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the charimachi bicycle route backend.
//!
//! Serves the mobile-facing REST API under `/api/v1`: cycling directions
//! with warning-point overlays, a place search passthrough, the static
//! warning point list and per-route violation overlays. The prepared
//! datasets are read once at startup from the data directory (see
//! `charimachi_prepare`); route geometries live in an in-memory session
//! store.

pub mod config;
pub mod error;
mod handlers;

use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use charimachi_directions::providers::{PoiSearch, RoutingProvider};
use charimachi_directions::session::{InMemorySessionStore, SessionStore};
use charimachi_upstream::ConfigError;
use charimachi_upstream::nominatim::NominatimClient;
use charimachi_upstream::openrouteservice::OpenRouteServiceClient;
use charimachi_violation::store::{
    BUS_STOPS_FILE, VIOLATION_RATES_FILE, WARNING_POINTS_FILE, read_json_array,
};
use charimachi_violation_models::{BusStop, ViolationRecord, WarningPoint};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    /// Cycling route provider. `None` when no API key is configured, in
    /// which case directions requests fail with a configuration error.
    pub routing: Option<Arc<dyn RoutingProvider>>,
    /// Place search, also used for bicycle-parking lookups.
    pub poi: Arc<dyn PoiSearch>,
    /// Route geometries by session id.
    pub sessions: Arc<dyn SessionStore>,
    /// Violation records from `violation_rates.json`.
    pub violations: Vec<ViolationRecord>,
    /// Static warning points from `warning_points.json`.
    pub warning_points: Vec<WarningPoint>,
    /// Bus stop polygons from `bus_stops.json`.
    pub bus_stops: Vec<BusStop>,
    /// Source of randomness for advisory messages.
    pub rng: Mutex<StdRng>,
}

/// Reads a prepared dataset from `data_dir`. A missing or unreadable file
/// is logged and treated as empty so the server can still route.
fn load_dataset<T: DeserializeOwned>(data_dir: &Path, file: &str) -> Vec<T> {
    let path = data_dir.join(file);
    match read_json_array(&path) {
        Ok(items) => {
            log::info!("Loaded {} record(s) from {}", items.len(), path.display());
            items
        }
        Err(e) => {
            log::warn!("{}: {e}; continuing without it", path.display());
            Vec::new()
        }
    }
}

/// Builds the application state: upstream clients, the session store and
/// the datasets under `config.data_dir`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the search client cannot be built. A
/// missing routing API key is not an error; it only disables directions.
pub fn load_state(config: &ServerConfig) -> Result<AppState, ConfigError> {
    let routing: Option<Arc<dyn RoutingProvider>> = match OpenRouteServiceClient::from_registry() {
        Ok(client) => Some(Arc::new(client)),
        Err(e @ ConfigError::MissingCredential { .. }) => {
            log::warn!("{e}; directions requests will fail");
            None
        }
        Err(e) => return Err(e),
    };
    let poi = Arc::new(NominatimClient::from_registry()?);

    Ok(AppState {
        routing,
        poi,
        sessions: Arc::new(InMemorySessionStore::new(
            config.session_capacity,
            config.session_ttl,
        )),
        violations: load_dataset(&config.data_dir, VIOLATION_RATES_FILE),
        warning_points: load_dataset(&config.data_dir, WARNING_POINTS_FILE),
        bus_stops: load_dataset(&config.data_dir, BUS_STOPS_FILE),
        rng: Mutex::new(StdRng::from_entropy()),
    })
}

/// Registers the `/api/v1` routes. Malformed query strings are answered
/// with a 400 in the usual error envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::Validation(err.to_string()).into()
    }))
    .service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health))
            .route("/directions/bicycle", web::get().to(handlers::directions))
            .route("/search", web::get().to(handlers::search))
            .route("/warningPoint", web::get().to(handlers::warning_points))
            .route("/violation_rates", web::get().to(handlers::violation_rates)),
    );
}

/// Starts the charimachi API server.
///
/// Reads [`ServerConfig`] from the environment, builds the upstream
/// clients, loads the prepared datasets and starts the Actix-Web HTTP
/// server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the upstream clients cannot be
/// configured, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    log::info!("Loading data from {}...", config.data_dir.display());
    let state = web::Data::new(load_state(&config).map_err(std::io::Error::other)?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use charimachi_geometry::Coordinate;
    use charimachi_upstream::UpstreamError;
    use charimachi_upstream::nominatim::SearchCandidate;
    use charimachi_upstream::openrouteservice::{RouteFeature, RouteGeometry, RouteResponse};

    use super::*;

    /// Routes along a fixed three-point line, recording avoid polygons.
    struct FixedRouting {
        avoided: AtomicUsize,
    }

    #[async_trait]
    impl RoutingProvider for FixedRouting {
        async fn route(
            &self,
            start: Coordinate,
            end: Coordinate,
            avoid: &[Vec<Coordinate>],
        ) -> Result<RouteResponse, UpstreamError> {
            self.avoided.store(avoid.len(), Ordering::SeqCst);
            let mid = Coordinate::new((start.lon + end.lon) / 2.0, start.lat);
            Ok(RouteResponse {
                kind: "FeatureCollection".to_string(),
                bbox: Vec::new(),
                features: vec![RouteFeature {
                    bbox: Vec::new(),
                    kind: "Feature".to_string(),
                    properties: serde_json::json!({}),
                    geometry: RouteGeometry {
                        kind: "LineString".to_string(),
                        coordinates: vec![start, mid, end],
                    },
                }],
                metadata: serde_json::Value::Null,
            })
        }
    }

    struct FailingRouting;

    #[async_trait]
    impl RoutingProvider for FailingRouting {
        async fn route(
            &self,
            _start: Coordinate,
            _end: Coordinate,
            _avoid: &[Vec<Coordinate>],
        ) -> Result<RouteResponse, UpstreamError> {
            Err(UpstreamError::Status {
                service: "openrouteservice",
                status: 403,
                message: "quota exceeded".to_string(),
            })
        }
    }

    struct StubSearch;

    #[async_trait]
    impl PoiSearch for StubSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, UpstreamError> {
            Ok(vec![
                serde_json::from_value(serde_json::json!({
                    "lat": "35.681",
                    "lon": "139.767",
                    "name": query,
                    "display_name": format!("{query}, Tokyo"),
                }))
                .unwrap(),
            ])
        }

        async fn bike_parking_near(
            &self,
            _at: Coordinate,
        ) -> Result<Option<Coordinate>, UpstreamError> {
            Ok(None)
        }
    }

    fn state_with(routing: Option<Arc<dyn RoutingProvider>>) -> AppState {
        AppState {
            routing,
            poi: Arc::new(StubSearch),
            sessions: Arc::new(InMemorySessionStore::default()),
            violations: vec![
                ViolationRecord {
                    intersection: "日比谷".to_string(),
                    coordinate: Coordinate::new(139.76, 35.67),
                    violation_rate: 0.45,
                    violation_count: 90,
                    message: String::new(),
                },
                ViolationRecord {
                    intersection: "遠方".to_string(),
                    coordinate: Coordinate::new(140.5, 36.0),
                    violation_rate: 0.9,
                    violation_count: 10,
                    message: String::new(),
                },
            ],
            warning_points: vec![WarningPoint {
                kind: String::new(),
                name: "桜田門".to_string(),
                coordinate: Coordinate::new(139.77, 35.67),
                message: "指導警告".to_string(),
            }],
            bus_stops: vec![charimachi_violation::bus_stop::bus_stop(
                "stop-1",
                "日比谷",
                Coordinate::new(139.76, 35.67),
            )],
            rng: Mutex::new(StdRng::seed_from_u64(7)),
        }
    }

    fn fixed_routing() -> Arc<FixedRouting> {
        Arc::new(FixedRouting {
            avoided: AtomicUsize::new(0),
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let app = app!(state_with(None));
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "charimachi_server");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn directions_then_violation_rates() {
        let app = app!(state_with(Some(fixed_routing())));
        let req = test::TestRequest::get()
            .uri("/api/v1/directions/bicycle?start=139.75,35.67&end=139.78,35.67")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["comfort_score"], 49);
        assert_eq!(body["warning_points"].as_array().map(Vec::len), Some(0));
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(session_id.len(), 36);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/violation_rates?session_id={session_id}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        // The route is 139.75 -> 139.765 -> 139.78; neither record is
        // within 20 m of those three vertices.
        assert_eq!(body["violation_rates"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn violation_rates_match_route_vertices() {
        let app = app!(state_with(Some(fixed_routing())));
        // Midpoint lands exactly on the first record.
        let req = test::TestRequest::get()
            .uri("/api/v1/directions/bicycle?start=139.75,35.67&end=139.77,35.67&avoid_traffic_lights=true")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["comfort_score"], 79);
        let warnings = body["warning_points"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["name"], "桜田門");

        let session_id = body["session_id"].as_str().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/violation_rates?session_id={session_id}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let rates = body["violation_rates"].as_array().unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0]["type"], "警告 交差点");
        assert_eq!(rates[0]["violation_count"], 90);
        assert!(!rates[0]["message"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn avoid_bus_stops_passes_polygons() {
        let routing = fixed_routing();
        let app = app!(state_with(Some(routing.clone())));
        let req = test::TestRequest::get()
            .uri("/api/v1/directions/bicycle?start=139.75,35.67&end=139.78,35.67&avoid_bus_stops=true")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(routing.avoided.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn unknown_or_missing_session_is_null() {
        let app = app!(state_with(None));
        for uri in [
            "/api/v1/violation_rates",
            "/api/v1/violation_rates?session_id=",
            "/api/v1/violation_rates?session_id=nope",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, serde_json::json!({"violation_rates": null}), "{uri}");
        }
    }

    #[actix_web::test]
    async fn directions_validates_coordinates() {
        let app = app!(state_with(Some(fixed_routing())));
        for uri in [
            "/api/v1/directions/bicycle?end=139.78,35.67",
            "/api/v1/directions/bicycle?start=abc&end=139.78,35.67",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], 400);
        }
    }

    #[actix_web::test]
    async fn unrecognized_flag_values_read_as_off() {
        let app = app!(state_with(Some(fixed_routing())));
        let req = test::TestRequest::get()
            .uri(
                "/api/v1/directions/bicycle?start=139.75,35.67&end=139.78,35.67\
                 &via_bike_parking=maybe&avoid_bus_stops=1&avoid_traffic_lights=true",
            )
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["comfort_score"], 79);
    }

    #[actix_web::test]
    async fn directions_without_routing_is_config_error() {
        let app = app!(state_with(None));
        let req = test::TestRequest::get()
            .uri("/api/v1/directions/bicycle?start=139.75,35.67&end=139.78,35.67")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn routing_failure_is_bad_gateway() {
        let app = app!(state_with(Some(Arc::new(FailingRouting))));
        let req = test::TestRequest::get()
            .uri("/api/v1/directions/bicycle?start=139.75,35.67&end=139.78,35.67")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], 502);
    }

    #[actix_web::test]
    async fn search_passes_through() {
        let app = app!(state_with(None));
        let req = test::TestRequest::get()
            .uri("/api/v1/search?q=%E6%9D%B1%E4%BA%AC%E9%A7%85")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "東京駅");
        assert_eq!(body[0]["lat"], "35.681");

        let req = test::TestRequest::get().uri("/api/v1/search?q=").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn warning_point_list_is_static() {
        let app = app!(state_with(None));
        let req = test::TestRequest::get()
            .uri("/api/v1/warningPoint")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["message"], "指導警告");
    }

    #[::core::prelude::v1::test]
    fn missing_dataset_loads_empty() {
        let records: Vec<ViolationRecord> =
            load_dataset(Path::new("/nonexistent/charimachi"), VIOLATION_RATES_FILE);
        assert!(records.is_empty());
    }
}
