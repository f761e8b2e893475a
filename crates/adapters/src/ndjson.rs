// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited JSON harness output.
//!
//! Each non-blank line is one measurement object:
//!
//! ```text
//! {"name":"TestCtor","value":22.7932,"unit":"ns/iter","biggerIsBetter":false}
//! ```

use benchtrail_core::Measurement;

use crate::{finish, AdapterError, Result, ToolParser};

/// Parser for the `ndjson` tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdjsonParser;

impl ToolParser for NdjsonParser {
    fn tool(&self) -> &'static str {
        "ndjson"
    }

    fn parse(&self, output: &str) -> Result<Vec<Measurement>> {
        let mut benches = Vec::new();
        for (idx, line) in output.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let bench: Measurement =
                serde_json::from_str(line).map_err(|e| AdapterError::InvalidLine {
                    tool: self.tool(),
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            benches.push(bench);
        }
        finish(self.tool(), benches)
    }
}
