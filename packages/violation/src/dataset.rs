//! Builds violation records from extracted survey rows.
//!
//! Each row carries a road pair, a sidewalk-riding count and a total
//! bicycle count. The ratio is rounded to 2 significant figures and the
//! road pair is resolved to a coordinate through the intersection finder.
//! Rows that cannot be parsed or resolved are logged and dropped; only
//! file I/O aborts a build.

use std::path::Path;

use charimachi_geometry::BoundingBox;
use charimachi_intersection::{RoadNetwork, find_road_intersections};
use charimachi_violation_models::ViolationRecord;

use crate::DatasetError;
use crate::progress::ProgressCallback;

/// Area searched for every road pair (Tokyo).
pub const CITYWIDE_BBOX: BoundingBox = BoundingBox::new(138.94, 35.52, 139.92, 35.90);

/// Separators accepted between the two road names: the multiplication
/// sign and the full-width Latin `Ｘ` the survey files actually use.
pub const ROAD_PAIR_SEPARATORS: [char; 2] = ['×', 'Ｘ'];

/// Significant figures kept in [`ViolationRecord::violation_rate`].
pub const RATE_SIGNIFICANT_FIGURES: u8 = 2;

const ROAD_PAIR_COLUMN: usize = 2;
const SIDEWALK_COLUMN: usize = 9;
const TOTAL_COLUMN: usize = 10;

/// One usable survey row.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRow {
    /// Road pair as written, e.g. `"第一京浜Ｘ日比谷通り"`.
    pub intersection: String,
    /// Bicycles counted riding on the sidewalk.
    pub sidewalk: f64,
    /// All bicycles counted. Always positive.
    pub total: f64,
}

impl SurveyRow {
    /// Sidewalk share rounded to [`RATE_SIGNIFICANT_FIGURES`].
    #[must_use]
    pub fn rate(&self) -> f64 {
        violation_ratio(self.sidewalk, self.total).unwrap_or_default()
    }

    /// Sidewalk count as an integer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn violation_count(&self) -> u32 {
        self.sidewalk as u32
    }
}

/// Rounds `x` to `figures` significant figures.
///
/// Zero, subnormal and non-finite values are returned unchanged.
#[must_use]
pub fn round_to_significant_figures(x: f64, figures: u8) -> f64 {
    if !x.is_normal() || figures == 0 {
        return x;
    }
    let magnitude = x.abs().log10().floor();
    let scale = 10f64.powf(f64::from(figures) - 1.0 - magnitude);
    (x * scale).round() / scale
}

/// `sidewalk / total` at 2 significant figures, or `None` when `total` is
/// zero.
#[must_use]
pub fn violation_ratio(sidewalk: f64, total: f64) -> Option<f64> {
    (total > 0.0)
        .then(|| round_to_significant_figures(sidewalk / total, RATE_SIGNIFICANT_FIGURES))
}

/// Splits `"RoadA×RoadB"` (or `"RoadAＸRoadB"`) into trimmed names.
#[must_use]
pub fn split_road_pair(pair: &str) -> Option<(&str, &str)> {
    let (a, b) = pair.split_once(ROAD_PAIR_SEPARATORS)?;
    let (a, b) = (a.trim(), b.trim());
    (!a.is_empty() && !b.is_empty()).then_some((a, b))
}

/// Parses one CSV record. Returns `None` for short rows, unparsable or
/// negative counts, and zero totals, which also rejects header rows.
#[must_use]
pub fn parse_survey_record(record: &csv::StringRecord) -> Option<SurveyRow> {
    if record.len() <= TOTAL_COLUMN {
        return None;
    }
    let count = |i: usize| {
        record
            .get(i)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
    };
    let total = count(TOTAL_COLUMN).filter(|t| *t > 0.0)?;
    let sidewalk = count(SIDEWALK_COLUMN)?;

    Some(SurveyRow {
        intersection: record.get(ROAD_PAIR_COLUMN)?.trim().to_string(),
        sidewalk,
        total,
    })
}

/// Reads every usable row of an extracted survey CSV.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened. Records that
/// fail to decode are logged and skipped like any other unusable row.
pub fn read_survey_rows(path: &Path) -> Result<Vec<SurveyRow>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut skipped = 0_usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{}: skipping unreadable row: {e}", path.display());
                skipped += 1;
                continue;
            }
        };
        match parse_survey_record(&record) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    log::info!(
        "{}: {} row(s), {skipped} skipped",
        path.display(),
        rows.len()
    );
    Ok(rows)
}

/// Resolves each row to a coordinate and emits a record per success.
///
/// Rows are processed one at a time to stay polite to the road-network
/// service.
pub async fn build_violation_records(
    network: &dyn RoadNetwork,
    rows: &[SurveyRow],
    bbox: &BoundingBox,
    progress: &dyn ProgressCallback,
) -> Vec<ViolationRecord> {
    progress.set_total(rows.len() as u64);
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        progress.set_message(row.intersection.clone());

        let Some((road1, road2)) = split_road_pair(&row.intersection) else {
            log::warn!("Not a road pair: '{}'", row.intersection);
            progress.inc(1);
            continue;
        };

        let coordinate = match find_road_intersections(network, road1, road2, bbox)
            .await
            .and_then(|result| result.representative())
        {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Dropping '{}': {e}", row.intersection);
                progress.inc(1);
                continue;
            }
        };

        records.push(ViolationRecord {
            intersection: row.intersection.clone(),
            coordinate,
            violation_rate: row.rate(),
            violation_count: row.violation_count(),
            message: String::new(),
        });
        progress.inc(1);
    }

    progress.finish(format!(
        "{} of {} intersection(s) resolved",
        records.len(),
        rows.len()
    ));
    records
}
