// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! The benchmark history document.
//!
//! A [`BenchmarkData`] maps suite names to the run records appended to them
//! by CI. Suites keep insertion order, and runs within a suite are
//! append-only with non-decreasing dates. The only way records leave a suite
//! is an explicit cap on its length.
//!
//! # Invariants
//!
//! ```text
//! entries[suite][i].date <= entries[suite][i + 1].date
//! lastUpdate never decreases
//! ```

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::record::RunRecord;
use crate::{Error, Result};

/// Suite name used when none is configured.
pub const DEFAULT_SUITE: &str = "Benchmark";

/// Full contents of a history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkData {
    /// Last time the document was appended to, in epoch milliseconds.
    pub last_update: i64,
    /// Repository the history belongs to.
    #[serde(default)]
    pub repo_url: String,
    /// Run records keyed by suite name.
    #[serde(default)]
    pub entries: IndexMap<String, Vec<RunRecord>>,
}

/// Knobs for [`BenchmarkData::append_run`].
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Keep at most this many runs in the suite, dropping the oldest.
    pub max_items: Option<usize>,
    /// Overwrite the document's repository URL.
    pub repo_url: Option<String>,
}

/// What an append did to the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Position of the new run within its suite after trimming.
    pub index: usize,
    /// Number of old runs dropped by the length cap.
    pub dropped: usize,
}

/// Result of [`BenchmarkData::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of suites inspected.
    pub suites: usize,
    /// Number of runs inspected.
    pub runs: usize,
    /// Invariant violations.
    pub errors: Vec<String>,
    /// Suspicious but tolerated findings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Whether no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl BenchmarkData {
    /// Create an empty document for a repository.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: Utc::now().timestamp_millis(),
            repo_url: repo_url.into(),
            entries: IndexMap::new(),
        }
    }

    /// Runs of a suite, oldest first.
    pub fn suite(&self, name: &str) -> Option<&[RunRecord]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Suite names in document order.
    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of runs across all suites.
    pub fn run_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Most recent run of a suite.
    pub fn latest(&self, suite: &str) -> Option<&RunRecord> {
        self.entries.get(suite).and_then(|runs| runs.last())
    }

    /// Most recent run of a suite whose commit differs from `commit_id`.
    ///
    /// Reruns of the same commit are skipped so that the result is a usable
    /// comparison baseline.
    pub fn previous_run(&self, suite: &str, commit_id: &str) -> Option<&RunRecord> {
        self.entries
            .get(suite)?
            .iter()
            .rev()
            .find(|run| run.commit.id != commit_id)
    }

    /// Append a run to a suite, creating the suite when needed.
    pub fn append_run(
        &mut self,
        suite: &str,
        record: RunRecord,
        options: &AppendOptions,
    ) -> Result<AppendOutcome> {
        self.append_run_at(suite, record, options, Utc::now().timestamp_millis())
    }

    /// [`BenchmarkData::append_run`] with an explicit wall clock.
    pub fn append_run_at(
        &mut self,
        suite: &str,
        record: RunRecord,
        options: &AppendOptions,
        now: i64,
    ) -> Result<AppendOutcome> {
        if suite.trim().is_empty() {
            return Err(Error::invalid_input("suite name is empty"));
        }
        if options.max_items == Some(0) {
            return Err(Error::invalid_input("max_items must be at least 1"));
        }
        record.validate()?;

        if let Some(last) = self.latest(suite) {
            if record.date < last.date {
                return Err(Error::OutOfOrder {
                    suite: suite.to_string(),
                    date: record.date,
                    last_date: last.date,
                });
            }
        }

        debug!(
            suite,
            commit = %record.commit.id,
            benches = record.benches.len(),
            "Appending run"
        );

        let runs = self.entries.entry(suite.to_string()).or_default();
        runs.push(record);
        let dropped = match options.max_items {
            Some(max) => trim_front(runs, max),
            None => 0,
        };
        let index = runs.len() - 1;

        self.last_update = self.last_update.max(now);
        if let Some(url) = &options.repo_url {
            self.repo_url = url.clone();
        }

        info!(suite, index, dropped, "Run appended");
        Ok(AppendOutcome { index, dropped })
    }

    /// Cap a suite at `max_items` runs, dropping the oldest. Returns the
    /// number of dropped runs.
    pub fn prune(&mut self, suite: &str, max_items: usize) -> Result<usize> {
        if max_items == 0 {
            return Err(Error::invalid_input("max_items must be at least 1"));
        }
        let runs = self
            .entries
            .get_mut(suite)
            .ok_or_else(|| Error::UnknownSuite(suite.to_string()))?;
        let dropped = trim_front(runs, max_items);
        if dropped > 0 {
            info!(suite, dropped, remaining = runs.len(), "Suite pruned");
        }
        Ok(dropped)
    }

    /// Check the document against the history invariants.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport {
            suites: self.entries.len(),
            runs: self.run_count(),
            ..Default::default()
        };

        for (suite, runs) in &self.entries {
            if suite.trim().is_empty() {
                report.errors.push("Suite with empty name".to_string());
            }

            let mut units: HashMap<&str, &str> = HashMap::new();
            let mut last_date: Option<i64> = None;

            for (i, run) in runs.iter().enumerate() {
                let at = format!("{suite}[{i}]");

                if let Some(prev) = last_date {
                    if run.date < prev {
                        report.errors.push(format!(
                            "{at}: date {} is older than previous run ({prev})",
                            run.date
                        ));
                    }
                }
                last_date = Some(run.date);

                if run.commit.id.trim().is_empty() {
                    report.errors.push(format!("{at}: empty commit id"));
                }
                if run.benches.is_empty() {
                    report.warnings.push(format!("{at}: run has no measurements"));
                }

                let mut seen: HashSet<&str> = HashSet::new();
                for bench in &run.benches {
                    if let Err(e) = bench.validate() {
                        report.errors.push(format!("{at}: {e}"));
                    }
                    if !seen.insert(bench.name.as_str()) {
                        report
                            .errors
                            .push(format!("{at}: duplicate test name '{}'", bench.name));
                    }
                    match units.get(bench.name.as_str()) {
                        Some(unit) if *unit != bench.unit => report.warnings.push(format!(
                            "{at}: unit of '{}' changed from '{unit}' to '{}'",
                            bench.name, bench.unit
                        )),
                        Some(_) => {}
                        None => {
                            units.insert(bench.name.as_str(), bench.unit.as_str());
                        }
                    }
                }
            }
        }

        report
    }
}

fn trim_front(runs: &mut Vec<RunRecord>, max: usize) -> usize {
    let excess = runs.len().saturating_sub(max);
    runs.drain(..excess);
    excess
}
