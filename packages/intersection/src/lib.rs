#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Finds where two named roads cross.
//!
//! Each road arrives as a set of [`Way`] polylines from a [`RoadNetwork`].
//! Candidates come from two passes:
//!
//! 1. Exact segment-by-segment crossings across every pair of Ways.
//! 2. A proximity fallback: any road-1 node within
//!    [`PROXIMITY_TOLERANCE_M`] (great-circle) of a road-2 node. This
//!    catches roads that meet at a shared node or stop just short of each
//!    other, which the segment test misses.
//!
//! Candidates are deduplicated to 6 decimal places, keeping the order in
//! which they were first seen (segment hits before proximity hits).

use std::collections::HashSet;

use async_trait::async_trait;
use charimachi_geometry::{BoundingBox, Coordinate, haversine_distance_m, segment_intersection};
use charimachi_upstream::UpstreamError;
use charimachi_upstream::overpass::{OverpassClient, Way};
use serde::Serialize;

/// Node-to-node distance, in meters, under which two roads are considered
/// to meet even without a segment crossing.
pub const PROXIMITY_TOLERANCE_M: f64 = 10.0;

/// Errors from intersection lookups.
#[derive(Debug, thiserror::Error)]
pub enum IntersectionError {
    /// Fetching road geometry failed, or a road matched no Ways.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Both roads exist but never meet inside the bounding box.
    #[error("no intersection found between '{road1}' and '{road2}'")]
    NotFound {
        /// First road name.
        road1: String,
        /// Second road name.
        road2: String,
    },
}

/// Source of named road polylines.
#[async_trait]
pub trait RoadNetwork: Send + Sync {
    /// Returns every Way named `road_name` inside `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on fetch failure, or
    /// [`UpstreamError::NoWays`] if the road does not exist in `bbox`.
    async fn ways(&self, road_name: &str, bbox: &BoundingBox) -> Result<Vec<Way>, UpstreamError>;
}

#[async_trait]
impl RoadNetwork for OverpassClient {
    async fn ways(&self, road_name: &str, bbox: &BoundingBox) -> Result<Vec<Way>, UpstreamError> {
        self.fetch_ways(road_name, bbox).await
    }
}

/// Outcome of an intersection lookup between two roads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionResult {
    /// First road name.
    pub road1: String,
    /// Second road name.
    pub road2: String,
    /// Area the roads were fetched from.
    pub bbox: BoundingBox,
    /// Ways making up the first road.
    pub road1_ways: Vec<Way>,
    /// Ways making up the second road.
    pub road2_ways: Vec<Way>,
    /// Deduplicated crossing points, first-seen order.
    pub intersections: Vec<Coordinate>,
}

impl IntersectionResult {
    /// The first crossing point found.
    ///
    /// # Errors
    ///
    /// Returns [`IntersectionError::NotFound`] if the roads never meet.
    pub fn representative(&self) -> Result<Coordinate, IntersectionError> {
        self.intersections
            .first()
            .copied()
            .ok_or_else(|| IntersectionError::NotFound {
                road1: self.road1.clone(),
                road2: self.road2.clone(),
            })
    }
}

/// Fetches both roads concurrently and computes where they meet.
///
/// An empty intersection list is not an error here; callers that need a
/// single point use [`IntersectionResult::representative`].
///
/// # Errors
///
/// Returns [`IntersectionError::Upstream`] if either fetch fails.
pub async fn find_road_intersections(
    network: &dyn RoadNetwork,
    road1: &str,
    road2: &str,
    bbox: &BoundingBox,
) -> Result<IntersectionResult, IntersectionError> {
    let (road1_ways, road2_ways) =
        futures::try_join!(network.ways(road1, bbox), network.ways(road2, bbox))?;

    let intersections = find_intersections(&road1_ways, &road2_ways, PROXIMITY_TOLERANCE_M);
    log::info!(
        "'{road1}' x '{road2}': {} way(s) x {} way(s), {} intersection(s)",
        road1_ways.len(),
        road2_ways.len(),
        intersections.len()
    );

    Ok(IntersectionResult {
        road1: road1.to_string(),
        road2: road2.to_string(),
        bbox: *bbox,
        road1_ways,
        road2_ways,
        intersections,
    })
}

/// Computes crossing points between two sets of Ways.
///
/// Proximity hits report the road-1 node. Ways with fewer than two nodes
/// contribute no segments but still take part in the proximity pass.
#[must_use]
pub fn find_intersections(
    road1_ways: &[Way],
    road2_ways: &[Way],
    tolerance_m: f64,
) -> Vec<Coordinate> {
    let mut seen = HashSet::new();
    let mut intersections = Vec::new();
    let mut push = |c: Coordinate| {
        if seen.insert(c.dedup_key()) {
            intersections.push(c);
        }
    };

    for way1 in road1_ways {
        for way2 in road2_ways {
            for seg1 in way1.coordinates.windows(2) {
                for seg2 in way2.coordinates.windows(2) {
                    if let Some(hit) = segment_intersection(seg1[0], seg1[1], seg2[0], seg2[1]) {
                        log::debug!("segment hit {hit:?} (way {} x way {})", way1.id, way2.id);
                        push(hit);
                    }
                }
            }
        }
    }

    for way1 in road1_ways {
        for way2 in road2_ways {
            for &a in &way1.coordinates {
                for &b in &way2.coordinates {
                    let distance = haversine_distance_m(a, b);
                    if distance <= tolerance_m {
                        log::debug!(
                            "proximity hit {a:?} ({distance:.2} m, way {} x way {})",
                            way1.id,
                            way2.id
                        );
                        push(a);
                    }
                }
            }
        }
    }

    intersections
}
