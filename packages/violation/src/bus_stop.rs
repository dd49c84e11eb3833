//! Avoidance squares around bus stops.

use charimachi_geometry::Coordinate;
use charimachi_violation_models::BusStop;

/// Half the side of the square around each stop, in meters.
pub const BUS_STOP_HALF_SIZE_M: f64 = 10.0;

/// Meters per degree of latitude.
const LAT_METERS_PER_DEGREE: f64 = 111_000.0;

/// Meters per degree of longitude around 35°N.
const LON_METERS_PER_DEGREE: f64 = 91_000.0;

/// Closed clockwise square (NW, NE, SE, SW, NW) around `center`.
#[must_use]
pub fn square_around(center: Coordinate, half_size_m: f64) -> Vec<Coordinate> {
    let dlat = half_size_m / LAT_METERS_PER_DEGREE;
    let dlon = half_size_m / LON_METERS_PER_DEGREE;
    let nw = Coordinate::new(center.lon - dlon, center.lat + dlat);
    vec![
        nw,
        Coordinate::new(center.lon + dlon, center.lat + dlat),
        Coordinate::new(center.lon + dlon, center.lat - dlat),
        Coordinate::new(center.lon - dlon, center.lat - dlat),
        nw,
    ]
}

/// A bus stop with its avoidance square.
#[must_use]
pub fn bus_stop(id: &str, name: &str, center: Coordinate) -> BusStop {
    BusStop {
        id: id.to_string(),
        name: name.to_string(),
        latitude: center.lat,
        longitude: center.lon,
        polygon: square_around(center, BUS_STOP_HALF_SIZE_M),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_is_closed_with_five_points() {
        let stop = bus_stop("s1", "新橋駅前", Coordinate::new(139.758, 35.666));
        assert_eq!(stop.polygon.len(), 5);
        assert_eq!(stop.polygon.first(), stop.polygon.last());
        assert_eq!(stop.coordinate(), Coordinate::new(139.758, 35.666));
    }

    #[test]
    fn square_spans_ten_meters_each_way() {
        let center = Coordinate::new(139.0, 35.0);
        let ring = square_around(center, BUS_STOP_HALF_SIZE_M);
        assert!((ring[0].lat - center.lat - 10.0 / 111_000.0).abs() < 1e-12);
        assert!((center.lon - ring[0].lon - 10.0 / 91_000.0).abs() < 1e-12);
        assert!(ring[1].lon > ring[0].lon);
        assert!(ring[2].lat < ring[1].lat);
    }
}
