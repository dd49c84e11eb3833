#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline preparation of the datasets the server loads at startup.
//!
//! Each step fetches or reads raw data and writes one JSON array into the
//! output directory:
//!
//! 1. **extract**: filters the intersection survey CSVs down to the
//!    12-hour all-direction count rows.
//! 2. **violations**: resolves each survey row to an intersection
//!    coordinate and writes `violation_rates.json`.
//! 3. **bus-stops**: fetches Toei bus stop poles and writes
//!    `bus_stops.json`.
//! 4. **warning-points**: geocodes the enforcement-intensive
//!    intersections and writes `warning_points.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use charimachi_directions::providers::PoiSearch;
use charimachi_upstream::odpt::BusstopPole;
use charimachi_upstream::tokyo_open_data::EnforcementHit;
use charimachi_violation::bus_stop::bus_stop;
use charimachi_violation::progress::ProgressCallback;
use charimachi_violation_models::{BusStop, WarningPoint};

/// Pause between geocoding requests. The public Nominatim instance
/// allows about one request per second.
pub const GEOCODE_INTERVAL: Duration = Duration::from_secs(1);

/// Category given to enforcement warning points.
pub const ENFORCEMENT_KIND: &str = "intersection";

/// Output file for `extract`: `<outdir>/<dirname>_filtered.csv`, where
/// `dirname` is the last component of the scanned directory.
#[must_use]
pub fn extract_output_path(dir: &Path, outdir: &Path) -> PathBuf {
    let name = dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| dir.file_name())
        .map_or_else(|| "survey".to_string(), |n| n.to_string_lossy().into_owned());
    outdir.join(format!("{name}_filtered.csv"))
}

/// Converts bus stop poles into avoid-squares. Poles without a position
/// are dropped.
#[must_use]
pub fn bus_stops_from_poles(poles: &[BusstopPole]) -> Vec<BusStop> {
    let stops: Vec<BusStop> = poles
        .iter()
        .filter_map(|pole| {
            let Some(center) = pole.coordinate() else {
                log::debug!("Skipping pole without position: {}", pole.preferred_id());
                return None;
            };
            Some(bus_stop(pole.preferred_id(), pole.preferred_name(), center))
        })
        .collect();

    log::info!(
        "{} of {} pole(s) have a position",
        stops.len(),
        poles.len()
    );
    stops
}

/// Geocodes each enforcement location with the first search candidate.
///
/// Locations the search cannot resolve, or that fail, are logged and
/// dropped. `interval` is slept between requests.
pub async fn geocode_warning_points(
    geocoder: &dyn PoiSearch,
    hits: &[EnforcementHit],
    interval: Duration,
    progress: &dyn ProgressCallback,
) -> Vec<WarningPoint> {
    progress.set_total(hits.len() as u64);
    let mut points = Vec::with_capacity(hits.len());

    for (index, hit) in hits.iter().enumerate() {
        if index > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        let query = hit.search_location();
        progress.set_message(query.clone());

        match geocoder.search(&query).await {
            Ok(candidates) => {
                match candidates.first().and_then(|c| c.coordinate()) {
                    Some(coordinate) => points.push(WarningPoint {
                        kind: ENFORCEMENT_KIND.to_string(),
                        name: hit.location.clone(),
                        coordinate,
                        message: hit.reason.clone(),
                    }),
                    None => log::warn!("No geocoding result for '{query}'"),
                }
            }
            Err(e) => log::warn!("Geocoding '{query}' failed: {e}"),
        }
        progress.inc(1);
    }

    progress.finish(format!("{} of {} location(s) geocoded", points.len(), hits.len()));
    points
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use charimachi_geometry::Coordinate;
    use charimachi_upstream::UpstreamError;
    use charimachi_upstream::nominatim::SearchCandidate;
    use charimachi_violation::progress::NullProgress;

    use super::*;

    /// Resolves queries containing "駅" and records every query.
    struct StationGeocoder {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PoiSearch for StationGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, UpstreamError> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.contains("失敗") {
                return Err(UpstreamError::Status {
                    service: "nominatim",
                    status: 503,
                    message: "busy".to_string(),
                });
            }
            if !query.contains('駅') {
                return Ok(Vec::new());
            }
            Ok(vec![
                serde_json::from_value(serde_json::json!({"lat": "35.666", "lon": "139.758"}))
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

    fn hit(location: &str, reason: &str) -> EnforcementHit {
        serde_json::from_value(serde_json::json!({
            "row": 1,
            "実施場所": location,
            "取締理由": reason,
        }))
        .unwrap()
    }

    fn pole(json: serde_json::Value) -> BusstopPole {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn geocodes_first_candidate_and_drops_misses() {
        let geocoder = StationGeocoder {
            queries: Mutex::new(Vec::new()),
        };
        let hits = [
            hit("新橋駅前交差点付近", "信号無視"),
            hit("どこか付近", "一時不停止"),
            hit("失敗駅", "右側通行"),
        ];
        let points =
            geocode_warning_points(&geocoder, &hits, Duration::ZERO, &NullProgress).await;

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "新橋駅前交差点付近");
        assert_eq!(points[0].message, "信号無視");
        assert_eq!(points[0].kind, ENFORCEMENT_KIND);
        assert_eq!(points[0].coordinate, Coordinate::new(139.758, 35.666));
        assert_eq!(
            *geocoder.queries.lock().unwrap(),
            vec!["新橋駅前交差点", "どこか", "失敗駅"]
        );
    }

    #[test]
    fn poles_without_position_are_dropped() {
        let poles = [
            pole(serde_json::json!({
                "@id": "urn:ucode:1",
                "owl:sameAs": "odpt.BusstopPole:Toei.Shimbashi.1",
                "dc:title": "新橋",
                "title": {"en": "Shimbashi"},
                "geo:lat": 35.666,
                "geo:long": 139.758,
            })),
            pole(serde_json::json!({
                "@id": "urn:ucode:2",
                "dc:title": "不明",
            })),
        ];
        let stops = bus_stops_from_poles(&poles);
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id, "odpt.BusstopPole:Toei.Shimbashi.1");
        assert_eq!(stops[0].name, "新橋");
        assert_eq!(stops[0].polygon.len(), 5);
        assert_eq!(stops[0].polygon.first(), stops[0].polygon.last());
    }

    #[test]
    fn extract_output_named_after_directory() {
        let path = extract_output_path(Path::new("/nonexistent/survey_2023"), Path::new("out"));
        assert_eq!(path, PathBuf::from("out/survey_2023_filtered.csv"));
    }
}
