#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate types and geometry primitives.
//!
//! Two distance functions live here and they are deliberately separate:
//!
//! * [`planar_distance`] works in raw degree space and is only meaningful
//!   for short-range tolerance checks against a degree threshold (see
//!   [`meters_to_degrees`]).
//! * [`haversine_distance_m`] is a true great-circle distance in meters.
//!
//! Mixing a degree threshold with a meter distance (or vice versa) is the
//! classic bug this split exists to prevent.

use geo::{Distance as _, Haversine, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Meters spanned by one degree of latitude (and of longitude at the
/// equator). Used for the fixed degree/meter approximation.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Determinant magnitude below which two lines are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// A WGS84 position as `(longitude, latitude)` in decimal degrees.
///
/// Serialized as a two-element `[longitude, latitude]` JSON array, the
/// ordering used by every upstream provider and every data file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude (x).
    pub lon: f64,
    /// Latitude (y).
    pub lat: f64,
}

impl Coordinate {
    /// Creates a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Key used to collapse coordinates that are equal to 6 decimal
    /// places (~0.1 m).
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{:.6},{:.6}", self.lon, self.lat)
    }

    /// Formats as the `lon,lat` string accepted by the routing provider.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        format!("{},{}", self.lon, self.lat)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Self::new(c.lon, c.lat)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = ParseCoordinateError;

    /// Parses `"lon,lat"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseCoordinateError {
                input: s.to_string(),
            });
        };
        let lon: f64 = lon.parse().map_err(|_| ParseCoordinateError {
            input: s.to_string(),
        })?;
        let lat: f64 = lat.parse().map_err(|_| ParseCoordinateError {
            input: s.to_string(),
        })?;
        Ok(Self { lon, lat })
    }
}

/// Error returned when a `"lon,lat"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate '{input}': expected \"longitude,latitude\"")]
pub struct ParseCoordinateError {
    /// The rejected input.
    pub input: String,
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Square box of `half_size` degrees around `center`.
    #[must_use]
    pub fn around(center: Coordinate, half_size: f64) -> Self {
        Self::new(
            center.lon - half_size,
            center.lat - half_size,
            center.lon + half_size,
            center.lat + half_size,
        )
    }
}

/// Euclidean distance in degree space.
#[must_use]
pub fn planar_distance(a: Coordinate, b: Coordinate) -> f64 {
    (a.lon - b.lon).hypot(a.lat - b.lat)
}

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Converts meters to degrees with the fixed [`METERS_PER_DEGREE`]
/// approximation.
#[must_use]
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Intersection of segment `p1–p2` with segment `p3–p4`.
///
/// Returns `None` for parallel (or degenerate) segments and for lines that
/// would only meet beyond either segment's endpoints.
#[must_use]
pub fn segment_intersection(
    p1: Coordinate,
    p2: Coordinate,
    p3: Coordinate,
    p4: Coordinate,
) -> Option<Coordinate> {
    let (x1, y1) = (p1.lon, p1.lat);
    let (x2, y2) = (p2.lon, p2.lat);
    let (x3, y3) = (p3.lon, p3.lat);
    let (x4, y4) = (p4.lon, p4.lat);

    let denom = (x1 - x2).mul_add(y3 - y4, -((y1 - y2) * (x3 - x4)));
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (x1 - x3).mul_add(y3 - y4, -((y1 - y3) * (x3 - x4))) / denom;
    let u = -(x1 - x2).mul_add(y1 - y3, -((y1 - y2) * (x1 - x3))) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Coordinate::new(
            t.mul_add(x2 - x1, x1),
            t.mul_add(y2 - y1, y1),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Coordinate, b: Coordinate) -> bool {
        (a.lon - b.lon).abs() < 1e-9 && (a.lat - b.lat).abs() < 1e-9
    }

    #[test]
    fn planar_distance_is_symmetric_and_zero_on_self() {
        let pairs = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(3.0, 4.0)),
            (
                Coordinate::new(139.745_494, 35.659_071),
                Coordinate::new(139.808_617, 35.709_907),
            ),
            (Coordinate::new(-10.5, 2.25), Coordinate::new(7.0, -3.0)),
        ];
        for (a, b) in pairs {
            assert!(
                (planar_distance(a, b) - planar_distance(b, a)).abs() < f64::EPSILON
            );
            assert!(planar_distance(a, a).abs() < f64::EPSILON);
        }
        assert!((planar_distance(pairs[0].0, pairs[0].1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_self() {
        let a = Coordinate::new(139.745_494, 35.659_071);
        let b = Coordinate::new(139.808_617, 35.709_907);
        assert!(
            (haversine_distance_m(a, b) - haversine_distance_m(b, a)).abs() < 1e-6
        );
        assert!(haversine_distance_m(a, a).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_distance_m(
            Coordinate::new(139.0, 35.0),
            Coordinate::new(139.0, 36.0),
        );
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn crossing_segments_meet_at_center() {
        let hit = segment_intersection(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 0.0),
        )
        .unwrap();
        assert!(approx(hit, Coordinate::new(0.5, 0.5)));
    }

    #[test]
    fn crossing_off_center() {
        // Horizontal y=1 from x=0..4 against vertical x=3 from y=0..2.
        let hit = segment_intersection(
            Coordinate::new(0.0, 1.0),
            Coordinate::new(4.0, 1.0),
            Coordinate::new(3.0, 0.0),
            Coordinate::new(3.0, 2.0),
        )
        .unwrap();
        assert!(approx(hit, Coordinate::new(3.0, 1.0)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(
            segment_intersection(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
            )
            .is_none()
        );
    }

    #[test]
    fn intersection_beyond_endpoints_is_rejected() {
        // The infinite lines cross at (2, 2), outside both segments.
        assert!(
            segment_intersection(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(4.0, 0.0),
                Coordinate::new(3.0, 1.0),
            )
            .is_none()
        );
    }

    #[test]
    fn degenerate_segment_returns_none() {
        let p = Coordinate::new(1.0, 1.0);
        assert!(
            segment_intersection(p, p, Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0))
                .is_none()
        );
    }

    #[test]
    fn coordinate_serializes_as_lon_lat_array() {
        let c = Coordinate::new(139.7, 35.6);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "[139.7,35.6]");
        let back: Coordinate = serde_json::from_str("[139.7,35.6]").unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn parses_lon_lat_query_string() {
        let c: Coordinate = "139.745494, 35.659071".parse().unwrap();
        assert!(approx(c, Coordinate::new(139.745_494, 35.659_071)));
        assert!("139.7".parse::<Coordinate>().is_err());
        assert!("a,b".parse::<Coordinate>().is_err());
        assert!("1,2,3".parse::<Coordinate>().is_err());
    }

    #[test]
    fn parse_error_names_the_input() {
        let err = "north".parse::<Coordinate>().unwrap_err();
        assert_eq!(err.input, "north");
        assert_eq!(
            err.to_string(),
            "invalid coordinate 'north': expected \"longitude,latitude\""
        );
    }

    #[test]
    fn dedup_key_rounds_to_six_places() {
        let a = Coordinate::new(139.123_456_71, 35.000_000_1);
        let b = Coordinate::new(139.123_456_74, 35.000_000_2);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn twenty_meters_in_degrees() {
        assert!((meters_to_degrees(20.0) - 1.797e-4).abs() < 1e-7);
    }
}
