//! Keeps the points that lie on a route.
//!
//! A point is on the route when some route coordinate is closer than
//! [`ROUTE_MATCH_DISTANCE_M`], measured in degree space with the fixed
//! [`METERS_PER_DEGREE`](charimachi_geometry::METERS_PER_DEGREE)
//! conversion. The scan walks the route in order and stops at the first
//! coordinate that qualifies, so the reported position is always a vertex
//! of the route polyline.

use charimachi_geometry::{Coordinate, meters_to_degrees, planar_distance};
use charimachi_violation_models::{
    SeverityTier, ViolationAnnotation, ViolationRecord, WarningPoint,
};
use rand::Rng;

use crate::messages::choose_message;

/// How close a point must be to a route vertex to count as on the route.
pub const ROUTE_MATCH_DISTANCE_M: f64 = 20.0;

/// [`ROUTE_MATCH_DISTANCE_M`] in degrees.
#[must_use]
pub fn route_match_threshold() -> f64 {
    meters_to_degrees(ROUTE_MATCH_DISTANCE_M)
}

/// First route coordinate strictly closer than `threshold_deg` to `point`.
#[must_use]
pub fn first_match_on_route(
    route: &[Coordinate],
    point: Coordinate,
    threshold_deg: f64,
) -> Option<Coordinate> {
    route
        .iter()
        .copied()
        .find(|&c| planar_distance(c, point) < threshold_deg)
}

/// Annotates every violation record lying on `route`.
///
/// Output order follows `violations`. Records off the route are dropped.
/// A record with a non-empty message keeps it; otherwise one is drawn
/// from the advisory pool.
pub fn filter_violations<R: Rng + ?Sized>(
    route: &[Coordinate],
    violations: &[ViolationRecord],
    rng: &mut R,
) -> Vec<ViolationAnnotation> {
    let threshold = route_match_threshold();

    let annotations: Vec<ViolationAnnotation> = violations
        .iter()
        .filter_map(|v| {
            let matched = first_match_on_route(route, v.coordinate, threshold)?;
            let message = if v.message.is_empty() {
                choose_message(rng).to_string()
            } else {
                v.message.clone()
            };
            Some(ViolationAnnotation {
                tier: SeverityTier::from_rate(v.violation_rate),
                violation_rate: v.violation_rate,
                violation_count: v.violation_count,
                coordinate: matched,
                message,
            })
        })
        .collect();

    log::debug!(
        "{} of {} violation record(s) on a {}-point route",
        annotations.len(),
        violations.len(),
        route.len()
    );
    annotations
}

/// Warning points lying on `route`, moved onto their matched route
/// coordinate.
#[must_use]
pub fn warning_points_on_route(route: &[Coordinate], points: &[WarningPoint]) -> Vec<WarningPoint> {
    let threshold = route_match_threshold();
    points
        .iter()
        .filter_map(|p| {
            first_match_on_route(route, p.coordinate, threshold).map(|matched| WarningPoint {
                coordinate: matched,
                ..p.clone()
            })
        })
        .collect()
}
