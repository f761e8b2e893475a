// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Custom JSON harness output with a fixed orientation.

use benchtrail_core::Measurement;
use serde::Deserialize;

use crate::{finish, AdapterError, Result, ToolParser};

#[derive(Debug, Deserialize)]
struct CustomEntry {
    name: String,
    value: f64,
    unit: String,
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    extra: Option<String>,
}

/// Parser for `customSmallerIsBetter` and `customBiggerIsBetter`.
///
/// The output is a JSON array of `{name, value, unit, range?, extra?}`
/// objects; orientation comes from the tool, not the data.
#[derive(Debug, Clone, Copy)]
pub struct CustomParser {
    tool: &'static str,
    bigger_is_better: bool,
}

impl CustomParser {
    /// Parser for the `customSmallerIsBetter` tool.
    pub fn smaller_is_better() -> Self {
        Self {
            tool: "customSmallerIsBetter",
            bigger_is_better: false,
        }
    }

    /// Parser for the `customBiggerIsBetter` tool.
    pub fn bigger_is_better() -> Self {
        Self {
            tool: "customBiggerIsBetter",
            bigger_is_better: true,
        }
    }
}

impl ToolParser for CustomParser {
    fn tool(&self) -> &'static str {
        self.tool
    }

    fn parse(&self, output: &str) -> Result<Vec<Measurement>> {
        let entries: Vec<CustomEntry> =
            serde_json::from_str(output).map_err(|source| AdapterError::InvalidDocument {
                tool: self.tool,
                source,
            })?;

        let benches = entries
            .into_iter()
            .map(|e| Measurement {
                name: e.name,
                value: e.value,
                range: e.range,
                unit: e.unit,
                extra: e.extra,
                bigger_is_better: self.bigger_is_better,
            })
            .collect();
        finish(self.tool, benches)
    }
}
