// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! libtest `cargo bench` output.
//!
//! Only result lines are read; everything else the harness prints is
//! skipped:
//!
//! ```text
//! test bench_fib ... bench:       1,234.50 ns/iter (+/- 56.70)
//! ```

use benchtrail_core::Measurement;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{finish, AdapterError, Result, ToolParser};

static BENCH_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^test (.+?)\s+\.\.\. bench:\s+([0-9,.]+) (\S+/\S+) \(\+/- ([0-9,.]+)\)$")
        .expect("bench line pattern is valid")
});

/// Parser for the `cargo` tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoParser;

impl ToolParser for CargoParser {
    fn tool(&self) -> &'static str {
        "cargo"
    }

    fn parse(&self, output: &str) -> Result<Vec<Measurement>> {
        let mut benches = Vec::new();
        for (idx, line) in output.lines().enumerate() {
            let Some(caps) = BENCH_LINE.captures(line.trim_end()) else {
                continue;
            };
            let number = |text: &str| {
                text.replace(',', "")
                    .parse::<f64>()
                    .map_err(|e| AdapterError::InvalidLine {
                        tool: self.tool(),
                        line: idx + 1,
                        message: format!("bad number '{text}': {e}"),
                    })
            };
            let value = number(&caps[2])?;
            number(&caps[4])?;
            let range = caps[4].replace(',', "");
            benches.push(Measurement::new(&caps[1], value, &caps[3]).range(format!("± {range}")));
        }
        finish(self.tool(), benches)
    }
}
