#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the offline dataset preparation tool.

use std::path::PathBuf;

use charimachi_cli_utils::IndicatifProgress;
use charimachi_prepare::{
    GEOCODE_INTERVAL, bus_stops_from_poles, extract_output_path, geocode_warning_points,
};
use charimachi_upstream::nominatim::NominatimClient;
use charimachi_upstream::odpt::OdptClient;
use charimachi_upstream::overpass::OverpassClient;
use charimachi_upstream::tokyo_open_data::TokyoOpenDataClient;
use charimachi_violation::dataset::{CITYWIDE_BBOX, build_violation_records, read_survey_rows};
use charimachi_violation::store::{
    BUS_STOPS_FILE, VIOLATION_RATES_FILE, WARNING_POINTS_FILE, write_json_array,
};
use charimachi_violation::survey::{extract_survey_rows, find_survey_files};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "charimachi_prepare", about = "Builds the charimachi server datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter intersection survey CSVs down to the 12-hour total rows
    Extract {
        /// Directory containing the survey CSV files
        dir: PathBuf,
        /// How many directory levels to descend below `dir` (0 = `dir` only)
        #[arg(long, default_value = "1")]
        depth: usize,
        /// Output directory
        #[arg(long, default_value = ".")]
        outdir: PathBuf,
    },
    /// Resolve filtered survey rows to intersections and write `violation_rates.json`
    Violations {
        /// Filtered survey CSV files (output of `extract`)
        #[arg(long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "data")]
        outdir: PathBuf,
    },
    /// Fetch Toei bus stops and write `bus_stops.json`
    BusStops {
        /// Output directory
        #[arg(long, default_value = "data")]
        outdir: PathBuf,
    },
    /// Geocode enforcement-intensive intersections and write `warning_points.json`
    WarningPoints {
        /// Output directory
        #[arg(long, default_value = "data")]
        outdir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = charimachi_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { dir, depth, outdir } => {
            let files = find_survey_files(&dir, depth)?;
            log::info!("Found {} survey file(s) under {}", files.len(), dir.display());
            std::fs::create_dir_all(&outdir)?;
            let out_path = extract_output_path(&dir, &outdir);
            let summary = extract_survey_rows(&files, &out_path)?;
            log::info!(
                "Wrote {} row(s) from {} file(s) to {}",
                summary.rows,
                summary.files,
                out_path.display()
            );
        }
        Commands::Violations { files, outdir } => {
            let network = OverpassClient::from_registry()?;
            let mut rows = Vec::new();
            for path in &files {
                match read_survey_rows(path) {
                    Ok(file_rows) => rows.extend(file_rows),
                    Err(e) => log::warn!("Skipping {}: {e}", path.display()),
                }
            }
            log::info!("{} survey row(s) from {} file(s)", rows.len(), files.len());

            let progress = IndicatifProgress::batch_bar(&multi, "Resolving intersections");
            let records =
                build_violation_records(&network, &rows, &CITYWIDE_BBOX, progress.as_ref()).await;
            write_json_array(&outdir.join(VIOLATION_RATES_FILE), &records)?;
        }
        Commands::BusStops { outdir } => {
            let client = OdptClient::from_registry()?;
            let poles = client.fetch_bus_stop_poles().await?;
            let stops = bus_stops_from_poles(&poles);
            write_json_array(&outdir.join(BUS_STOPS_FILE), &stops)?;
        }
        Commands::WarningPoints { outdir } => {
            let hits = TokyoOpenDataClient::from_registry()?
                .fetch_enforcement_intersections()
                .await?;
            log::info!("{} enforcement location(s)", hits.len());

            let geocoder = NominatimClient::from_registry()?;
            let progress = IndicatifProgress::batch_bar(&multi, "Geocoding");
            let points =
                geocode_warning_points(&geocoder, &hits, GEOCODE_INTERVAL, progress.as_ref()).await;
            write_json_array(&outdir.join(WARNING_POINTS_FILE), &points)?;
        }
    }

    Ok(())
}
