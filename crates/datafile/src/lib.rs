//! Benchmark history files for continuous-benchmarking dashboards.
//!
//! This crate reads and writes the `data.js` files that hold a repository's
//! benchmark history, finds them in a results tree and renders markdown
//! reports from them.
//!
//! # Quick Start
//!
//! ```no_run
//! use benchtrail_datafile::{io, markdown};
//!
//! let data = io::read_data_file("perf/results/ustrperf/TestNames_Latin/data.js")?;
//! println!("{}", markdown::generate_summary(&data));
//! # Ok::<(), benchtrail_datafile::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`codec`] - the `window.BENCHMARK_DATA = ...` text format
//! - [`io`] - filesystem reads, atomic writes and discovery
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod codec;
pub mod io;
pub mod markdown;

use std::path::PathBuf;
use thiserror::Error;

pub use io::{discover, read_data_file, read_or_init, write_data_file, DataFileEntry};

/// Errors raised while handling history files.
#[derive(Debug, Error)]
pub enum Error {
    /// The text does not start with the `window.BENCHMARK_DATA =` assignment.
    #[error("Not a benchmark data file: missing 'window.BENCHMARK_DATA =' assignment")]
    MissingPrefix,

    /// The JSON payload is malformed or does not match the history layout.
    #[error("Invalid benchmark data at line {line}, column {column}: {message}")]
    Syntax {
        /// 1-based line within the file.
        line: usize,
        /// 1-based column within the line.
        column: usize,
        /// Parser message without its position.
        message: String,
    },

    /// JSON encoding or decoding failed outside of a file position.
    #[error("Invalid benchmark data: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failure while walking a results tree.
    #[error("Cannot scan results tree: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for history file operations.
pub type Result<T> = std::result::Result<T, Error>;
