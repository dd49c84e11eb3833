#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Violation-rate data: building it offline, matching it to routes online.
//!
//! The offline half turns bicycle traffic survey CSVs into
//! [`ViolationRecord`](charimachi_violation_models::ViolationRecord)s by
//! resolving each surveyed road pair to a coordinate ([`dataset`]). The
//! online half keeps only the records that lie on a given route and
//! annotates them ([`proximity`]).

pub mod bus_stop;
pub mod dataset;
pub mod messages;
pub mod progress;
pub mod proximity;
pub mod store;
pub mod survey;

use std::path::PathBuf;

/// Errors from reading or writing dataset files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Filesystem error, with the path involved.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
