// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for benchmark history.
//!
//! This crate models the documents that continuous-benchmarking pipelines
//! append to after every CI run and that dashboards read back:
//!
//! - [`record`] - run records, commit metadata and measurements
//! - [`history`] - the append-only history document keyed by suite
//! - [`series`] - per-test time series, statistics and run comparison
//!
//! # Example
//!
//! ```
//! use benchtrail_core::{AppendOptions, BenchmarkData, Commit, CommitUser, Measurement, RunRecord};
//!
//! let commit = Commit {
//!     author: CommitUser::new("dev", "dev@example.com"),
//!     committer: CommitUser::new("dev", "dev@example.com"),
//!     distinct: None,
//!     id: "80ee559205dd165c2d647610376d6f9a06822ae4".into(),
//!     message: "Speed up scanning".into(),
//!     timestamp: "2022-03-07T12:53:44-08:00".into(),
//!     tree_id: "7da686bd1662079612215dc8b0f27437626720c3".into(),
//!     url: "https://example.com/commit/80ee559".into(),
//! };
//! let run = RunRecord::builder()
//!     .commit(commit)
//!     .tool("ndjson")
//!     .measurement(Measurement::new("TestScan", 27.88, "ns/iter"))
//!     .build()
//!     .unwrap();
//!
//! let mut data = BenchmarkData::new("https://example.com/repo");
//! data.append_run("Benchmark", run, &AppendOptions::default()).unwrap();
//! assert_eq!(data.run_count(), 1);
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod history;
pub mod record;
pub mod series;

pub use error::{Error, Result};
pub use history::{
    AppendOptions, AppendOutcome, BenchmarkData, ValidationReport, DEFAULT_SUITE,
};
pub use record::{Commit, CommitUser, Measurement, RunRecord, RunRecordBuilder};
pub use series::{compare, reconstruct, Comparison, SeriesPoint, SeriesSet, SeriesStats, TimeSeries};
