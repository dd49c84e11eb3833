#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Records persisted by the offline tools and served by the API.
//!
//! Three flat JSON arrays live in the data directory:
//! [`ViolationRecord`]s (`violation_rates.json`), [`WarningPoint`]s
//! (`warning_points.json`) and [`BusStop`]s (`bus_stops.json`).
//! [`ViolationAnnotation`] is the per-request view of a record after it
//! has been matched to a route.

use charimachi_geometry::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Ratios below this are [`SeverityTier::Caution`].
pub const CAUTION_LIMIT: f64 = 0.3;

/// Ratios below this (and at least [`CAUTION_LIMIT`]) are
/// [`SeverityTier::Warning`].
pub const WARNING_LIMIT: f64 = 0.6;

/// Sidewalk-riding statistics for one surveyed intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Road pair as written in the survey, e.g. `"RoadA×RoadB"`.
    #[serde(default)]
    pub intersection: String,
    /// Resolved crossing point.
    pub coordinate: Coordinate,
    /// Sidewalk riders over all bicycles, 2 significant figures.
    pub violation_rate: f64,
    /// Number of sidewalk riders counted.
    #[serde(default)]
    pub violation_count: u32,
    /// Advisory text; empty at build time.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// How bad an intersection is, by violation ratio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SeverityTier {
    /// Ratio below 0.3.
    #[serde(rename = "注意 交差点")]
    #[strum(serialize = "注意 交差点")]
    Caution,
    /// Ratio from 0.3 up to (not including) 0.6.
    #[serde(rename = "警告 交差点")]
    #[strum(serialize = "警告 交差点")]
    Warning,
    /// Ratio 0.6 and above.
    #[serde(rename = "違反多発 交差点")]
    #[strum(serialize = "違反多発 交差点")]
    FrequentViolation,
}

impl SeverityTier {
    /// Tier for a violation ratio.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate < CAUTION_LIMIT {
            Self::Caution
        } else if rate < WARNING_LIMIT {
            Self::Warning
        } else {
            Self::FrequentViolation
        }
    }
}

/// A violation record matched to a point on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationAnnotation {
    /// Severity label.
    #[serde(rename = "type")]
    pub tier: SeverityTier,
    /// Copied from the record.
    pub violation_rate: f64,
    /// Copied from the record.
    pub violation_count: u32,
    /// The matched route coordinate, so the marker sits on the polyline.
    pub coordinate: Coordinate,
    /// Advisory text drawn at request time.
    pub message: String,
}

/// A named hazard location with a warning message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningPoint {
    /// Optional category, e.g. `"intersection"`.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Local or official name of the place.
    pub name: String,
    /// Position.
    pub coordinate: Coordinate,
    /// What happens here (enforcement reason, accident history).
    pub message: String,
}

/// A bus stop and the small square around it that routes should avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Closed exterior ring (first point repeated last).
    #[serde(default)]
    pub polygon: Vec<Coordinate>,
}

impl BusStop {
    /// Center position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}
