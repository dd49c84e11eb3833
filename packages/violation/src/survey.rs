//! Extraction of intersection rows from raw bicycle traffic survey CSVs.
//!
//! Survey files (names containing `jitensya`) mix per-direction and
//! per-hour breakdowns. Only the 12-hour all-direction totals of
//! intersections (`RoadAＸRoadB`) are kept.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::DatasetError;

static SURVEY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ ?[0-9]+,[^,]+,[^,]+Ｘ[^,]+,[^,]+,[^,]+,[^,]+,全方向計,12時間計,[0-9]+,[0-9]+,[0-9\-]+",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// Marker that identifies bicycle survey files.
pub const SURVEY_FILE_MARKER: &str = "jitensya";

/// Totals of one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files read.
    pub files: usize,
    /// Lines written.
    pub rows: usize,
}

/// Whether `path` names a bicycle survey CSV.
#[must_use]
pub fn is_survey_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(SURVEY_FILE_MARKER) && n.ends_with(".csv"))
}

/// Whether `line` is a 12-hour all-direction intersection total.
#[must_use]
pub fn is_survey_line(line: &str) -> bool {
    SURVEY_LINE_RE.is_match(line)
}

/// Survey files under `root`, descending at most `max_depth` directory
/// levels (0 = `root` only). Unreadable directories are skipped.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if `root` itself cannot be read.
pub fn find_survey_files(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>, DatasetError> {
    let mut files = Vec::new();
    let entries = read_dir_sorted(root)?;
    walk(entries, 0, max_depth, &mut files);
    Ok(files)
}

fn walk(entries: Vec<PathBuf>, depth: usize, max_depth: usize, files: &mut Vec<PathBuf>) {
    for path in entries {
        if path.is_dir() {
            if depth < max_depth {
                match read_dir_sorted(&path) {
                    Ok(children) => walk(children, depth + 1, max_depth, files),
                    Err(e) => log::warn!("Skipping {}: {e}", path.display()),
                }
            }
        } else if is_survey_file(&path) {
            files.push(path);
        }
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    paths.sort();
    Ok(paths)
}

/// Copies every survey line of `files` into one CSV at `out_path`.
///
/// Files that cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns [`DatasetError`] if the output cannot be created or written.
pub fn extract_survey_rows(
    files: &[PathBuf],
    out_path: &Path,
) -> Result<ExtractSummary, DatasetError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(out_path)?;
    let mut summary = ExtractSummary::default();

    for path in files {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                continue;
            }
        };
        summary.files += 1;

        let text = String::from_utf8_lossy(&bytes);
        let mut matches = 0;
        for (index, line) in text.lines().enumerate() {
            if !is_survey_line(line) {
                continue;
            }
            log::debug!("{}:{}: {line:.100}", path.display(), index + 1);
            writer.write_record(&split_line(line))?;
            matches += 1;
        }
        log::info!("{}: {matches} matching line(s)", path.display());
        summary.rows += matches;
    }

    writer.flush().map_err(|source| DatasetError::Io {
        path: out_path.to_path_buf(),
        source,
    })?;
    Ok(summary)
}

/// Splits one CSV line into fields, falling back to a plain comma split
/// when the line is not well-formed CSV.
fn split_line(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => line.split(',').map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY_LINE: &str =
        " 12,港区,第一京浜Ｘ日比谷通り,1,2,3,4,全方向計,12時間計,150,600,-";

    #[test]
    fn matches_all_direction_totals_only() {
        assert!(is_survey_line(SURVEY_LINE));
        assert!(is_survey_line(SURVEY_LINE.trim_start()));
        assert!(!is_survey_line(
            " 12,港区,第一京浜Ｘ日比谷通り,1,2,3,4,北方向,12時間計,150,600,-"
        ));
        assert!(!is_survey_line(" 12,港区,第一京浜,1,2,3,4,全方向計,12時間計,150,600,-"));
        assert!(!is_survey_line("No,区,交差点名,..."));
    }

    #[test]
    fn recognizes_survey_file_names() {
        assert!(is_survey_file(Path::new("/d/r5_jitensya_01.csv")));
        assert!(!is_survey_file(Path::new("/d/r5_jitensya_01.xlsx")));
        assert!(!is_survey_file(Path::new("/d/r5_hokousya_01.csv")));
    }

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(split_line(r#"1,"a,b",c"#), vec!["1", "a,b", "c"]);
    }

    #[test]
    fn walks_to_limited_depth_and_extracts() {
        let root = std::env::temp_dir().join(format!("charimachi-survey-{}", std::process::id()));
        let deep = root.join("a").join("b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(
            root.join("top_jitensya.csv"),
            format!("header\n{SURVEY_LINE}\n"),
        )
        .unwrap();
        std::fs::write(root.join("a").join("mid_jitensya.csv"), SURVEY_LINE).unwrap();
        std::fs::write(deep.join("deep_jitensya.csv"), SURVEY_LINE).unwrap();
        std::fs::write(root.join("notes.txt"), SURVEY_LINE).unwrap();

        assert_eq!(find_survey_files(&root, 0).unwrap().len(), 1);
        let files = find_survey_files(&root, 1).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(find_survey_files(&root, 5).unwrap().len(), 3);

        let out = root.join("out.csv");
        let summary = extract_survey_rows(&files, &out).unwrap();
        assert_eq!(summary, ExtractSummary { files: 2, rows: 2 });
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.starts_with(" 12,港区,第一京浜Ｘ日比谷通り"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
