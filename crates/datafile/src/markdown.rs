//! Markdown output generation for benchmark history.
//!
//! This module renders a whole history document as a summary, and the
//! latest run of a suite next to its baseline as a comparison table.

use benchtrail_core::{compare, reconstruct, BenchmarkData, RunRecord};
use chrono::DateTime;
use std::fmt::{self, Write};

/// Generate a markdown summary of every suite in a document.
pub fn generate_summary(data: &BenchmarkData) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut output, data);
    output
}

/// Generate a markdown table comparing `current` with its baseline.
pub fn generate_comparison(suite: &str, previous: Option<&RunRecord>, current: &RunRecord) -> String {
    let mut output = String::new();
    let _ = write_comparison(&mut output, suite, previous, current);
    output
}

fn write_summary(output: &mut String, data: &BenchmarkData) -> fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;
    if !data.repo_url.is_empty() {
        writeln!(output, "Repository: {}", data.repo_url)?;
    }
    writeln!(output, "Last update: {}", format_date(data.last_update))?;
    writeln!(output)?;

    for (suite, runs) in &data.entries {
        writeln!(output, "## {suite}")?;
        writeln!(output)?;

        let (Some(first), Some(last)) = (runs.first(), runs.last()) else {
            writeln!(output, "No runs recorded.")?;
            writeln!(output)?;
            continue;
        };

        writeln!(output, "Runs: {}", runs.len())?;
        writeln!(
            output,
            "First: `{}` ({})",
            first.commit.short_id(),
            format_date(first.date)
        )?;
        writeln!(
            output,
            "Latest: `{}` ({}) {}",
            last.commit.short_id(),
            format_date(last.date),
            last.commit.summary()
        )?;
        writeln!(output)?;
        writeln!(output, "| Test | Latest | Unit | Min | Max | Mean | Samples |")?;
        writeln!(output, "|------|--------|------|-----|-----|------|---------|")?;

        for series in reconstruct(runs).values() {
            let Some(latest) = series.latest() else {
                continue;
            };
            let stats = series.stats();
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} |",
                series.name,
                format_value(latest.value),
                latest.unit,
                format_value(stats.min),
                format_value(stats.max),
                format_value(stats.mean),
                stats.sample_count
            )?;
        }
        writeln!(output)?;
    }

    writeln!(output, "---")?;
    writeln!(
        output,
        "Total: {} suites, {} runs",
        data.entries.len(),
        data.run_count()
    )?;
    Ok(())
}

fn write_comparison(
    output: &mut String,
    suite: &str,
    previous: Option<&RunRecord>,
    current: &RunRecord,
) -> fmt::Result {
    writeln!(output, "## Comparison: {suite}")?;
    writeln!(output)?;
    match previous {
        Some(prev) => writeln!(
            output,
            "Baseline: `{}` ({}), current: `{}` ({})",
            prev.commit.short_id(),
            format_date(prev.date),
            current.commit.short_id(),
            format_date(current.date)
        )?,
        None => writeln!(
            output,
            "No baseline run, current: `{}` ({})",
            current.commit.short_id(),
            format_date(current.date)
        )?,
    }
    writeln!(output)?;
    writeln!(output, "| Test | Previous | Current | Unit | Ratio |")?;
    writeln!(output, "|------|----------|---------|------|-------|")?;

    for row in compare(previous, current) {
        writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            row.name,
            row.previous.map(format_value).unwrap_or_else(|| "-".to_string()),
            format_value(row.current),
            row.unit,
            row.ratio
                .map(|r| format!("{r:.2}"))
                .unwrap_or_else(|| "-".to_string())
        )?;
    }
    Ok(())
}

fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn format_value(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}
