//! Flat JSON array files in the data directory.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::DatasetError;

/// File holding the violation records.
pub const VIOLATION_RATES_FILE: &str = "violation_rates.json";

/// File holding the static warning points.
pub const WARNING_POINTS_FILE: &str = "warning_points.json";

/// File holding the bus stop polygons.
pub const BUS_STOPS_FILE: &str = "bus_stops.json";

/// Reads a JSON array file.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Writes `items` as a pretty-printed JSON array, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be written.
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} record(s) to {}", items.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use charimachi_geometry::Coordinate;
    use charimachi_violation_models::WarningPoint;

    use super::*;

    #[test]
    fn writes_and_reads_back_array() {
        let dir = std::env::temp_dir().join(format!("charimachi-store-{}", std::process::id()));
        let path = dir.join("nested").join(WARNING_POINTS_FILE);
        let points = vec![WarningPoint {
            kind: String::new(),
            name: "新橋駅前".to_string(),
            coordinate: Coordinate::new(139.758, 35.666),
            message: "信号無視が多発".to_string(),
        }];

        write_json_array(&path, &points).unwrap();
        let back: Vec<WarningPoint> = read_json_array(&path).unwrap();
        assert_eq!(back, points);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/definitely/not/here.json");
        let err = read_json_array::<WarningPoint>(path).unwrap_err();
        assert!(matches!(err, DatasetError::Io { ref path, .. } if path.ends_with("here.json")));
    }
}
