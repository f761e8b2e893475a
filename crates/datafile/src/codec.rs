//! Encoding and decoding of `data.js` history files.
//!
//! A history file is a single JavaScript assignment so that a static page
//! can load it with a `<script>` tag:
//!
//! ```text
//! window.BENCHMARK_DATA = {
//!   "lastUpdate": 1646868759217,
//!   ...
//! }
//! ```

use benchtrail_core::BenchmarkData;

use crate::{Error, Result};

/// Text that precedes the JSON payload.
pub const PREFIX: &str = "window.BENCHMARK_DATA = ";

const VARIABLE: &str = "window.BENCHMARK_DATA";

/// Decode the contents of a `data.js` file.
///
/// Syntax errors carry line and column positions within `text`, not within
/// the JSON payload.
pub fn decode(text: &str) -> Result<BenchmarkData> {
    let rest = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .strip_prefix(VARIABLE)
        .ok_or(Error::MissingPrefix)?;
    let after_assign = rest
        .trim_start()
        .strip_prefix('=')
        .ok_or(Error::MissingPrefix)?;
    let start = text.len() - after_assign.len();
    let payload = after_assign.trim_end();
    let payload = payload.strip_suffix(';').unwrap_or(payload);

    serde_json::from_str(payload).map_err(|e| locate(e, &text[..start]))
}

/// Shift a payload error position by the text that precedes the payload.
fn locate(err: serde_json::Error, before: &str) -> Error {
    if err.line() == 0 {
        return Error::Json(err);
    }
    let column = if err.line() == 1 {
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        err.column() + before[line_start..].chars().count()
    } else {
        err.column()
    };
    let full = err.to_string();
    let message = full
        .rsplit_once(" at line ")
        .map_or(full.as_str(), |(message, _)| message)
        .to_string();
    Error::Syntax {
        line: err.line() + before.matches('\n').count(),
        column,
        message,
    }
}

/// Encode a document the way the dashboard writes it: the assignment
/// prefix followed by two-space indented JSON, without a trailing newline.
pub fn encode(data: &BenchmarkData) -> Result<String> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(format!("{PREFIX}{json}"))
}
