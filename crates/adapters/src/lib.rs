// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark harness adapters.
//!
//! Every run record names the `tool` its measurements were parsed from.
//! This crate provides the canonical [`ToolParser`] trait and a registry of
//! the supported harness formats:
//!
//! - **ndjson**: one JSON measurement per line
//! - **cargo**: libtest `cargo bench` output
//! - **customSmallerIsBetter** / **customBiggerIsBetter**: a JSON array of
//!   measurements with a fixed orientation
//!
//! # Example
//!
//! ```
//! use benchtrail_adapters::parser_for;
//!
//! let parser = parser_for("ndjson")?;
//! let benches = parser.parse(r#"{"name":"TestCtor","value":22.79,"unit":"ns/iter"}"#)?;
//! assert_eq!(benches[0].name, "TestCtor");
//! # Ok::<(), benchtrail_adapters::AdapterError>(())
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod cargo;
pub mod custom;
pub mod ndjson;

use benchtrail_core::Measurement;
use thiserror::Error;

pub use cargo::CargoParser;
pub use custom::CustomParser;
pub use ndjson::NdjsonParser;

/// Errors that can occur while parsing harness output.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No parser is registered for the tool identifier.
    #[error("Unknown tool '{0}' (supported: {supported})", supported = supported_tools().join(", "))]
    UnknownTool(String),

    /// A line of line-oriented output could not be parsed.
    #[error("{tool}: line {line}: {message}")]
    InvalidLine {
        /// Tool identifier.
        tool: &'static str,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Document-oriented output could not be parsed.
    #[error("{tool}: {source}")]
    InvalidDocument {
        /// Tool identifier.
        tool: &'static str,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The output parsed but held no measurements.
    #[error("{0}: no benchmark results found in output")]
    NoMeasurements(&'static str),

    /// A parsed measurement is unusable.
    #[error(transparent)]
    Measurement(#[from] benchtrail_core::Error),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Canonical harness parser trait.
///
/// Implement this trait for every harness output format that can feed a
/// run record.
pub trait ToolParser: Send + Sync {
    /// The tool identifier stored in run records.
    fn tool(&self) -> &'static str;

    /// Parse raw harness output into measurements, in output order.
    fn parse(&self, output: &str) -> Result<Vec<Measurement>>;
}

/// Registry of all available parsers.
pub fn all_parsers() -> Vec<Box<dyn ToolParser>> {
    vec![
        Box::new(NdjsonParser),
        Box::new(CargoParser),
        Box::new(CustomParser::smaller_is_better()),
        Box::new(CustomParser::bigger_is_better()),
    ]
}

/// Tool identifiers known to [`all_parsers`].
pub fn supported_tools() -> Vec<&'static str> {
    all_parsers().iter().map(|p| p.tool()).collect()
}

/// Look up the parser for a tool identifier.
pub fn parser_for(tool: &str) -> Result<Box<dyn ToolParser>> {
    all_parsers()
        .into_iter()
        .find(|p| p.tool() == tool)
        .ok_or_else(|| AdapterError::UnknownTool(tool.to_string()))
}

/// Shared tail of every parser: reject empty output and invalid values.
pub(crate) fn finish(tool: &'static str, benches: Vec<Measurement>) -> Result<Vec<Measurement>> {
    if benches.is_empty() {
        return Err(AdapterError::NoMeasurements(tool));
    }
    for bench in &benches {
        bench.validate()?;
    }
    tracing::debug!(tool, count = benches.len(), "Parsed harness output");
    Ok(benches)
}
