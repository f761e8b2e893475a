// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-test time series reconstructed from run records.
//!
//! Test names recur across runs, so a suite can be pivoted into one series
//! per test name. Points keep run order, which is also date order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::RunRecord;

/// One observation of a test in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Run date in epoch milliseconds.
    pub date: i64,
    /// Commit the run measured.
    pub commit_id: String,
    /// Measured value.
    pub value: f64,
    /// Unit the value was reported in.
    pub unit: String,
    /// Spread, if the harness reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// All observations of one test name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Test identifier.
    pub name: String,
    /// Orientation taken from the most recent observation.
    pub bigger_is_better: bool,
    /// Observations, oldest first.
    pub points: Vec<SeriesPoint>,
}

/// Series keyed by test name, in order of first appearance.
pub type SeriesSet = IndexMap<String, TimeSeries>;

/// Summary statistics over a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// 50th percentile.
    pub median: f64,
    /// 90th percentile.
    pub p90: f64,
    /// Number of samples.
    pub sample_count: usize,
}

impl SeriesStats {
    /// Compute statistics from raw values. An empty slice yields zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean,
            std_dev: variance.sqrt(),
            median: sorted[n * 50 / 100],
            p90: sorted[(n * 90 / 100).min(n - 1)],
            sample_count: n,
        }
    }
}

impl TimeSeries {
    /// Values in point order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Most recent observation.
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Statistics over every observation.
    pub fn stats(&self) -> SeriesStats {
        SeriesStats::from_values(&self.values())
    }
}

/// Pivot runs into one series per test name.
pub fn reconstruct<'a>(runs: impl IntoIterator<Item = &'a RunRecord>) -> SeriesSet {
    let mut set = SeriesSet::new();
    for run in runs {
        for bench in &run.benches {
            let series = set
                .entry(bench.name.clone())
                .or_insert_with(|| TimeSeries {
                    name: bench.name.clone(),
                    bigger_is_better: bench.bigger_is_better,
                    points: Vec::new(),
                });
            series.bigger_is_better = bench.bigger_is_better;
            series.points.push(SeriesPoint {
                date: run.date,
                commit_id: run.commit.id.clone(),
                value: bench.value,
                unit: bench.unit.clone(),
                range: bench.range.clone(),
            });
        }
    }
    set
}

/// A test's value in the current run next to its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Test identifier.
    pub name: String,
    /// Unit of the current value.
    pub unit: String,
    /// Baseline value, if the test existed in the baseline run.
    pub previous: Option<f64>,
    /// Current value.
    pub current: f64,
    /// Oriented ratio; above 1.0 means the current run is worse.
    pub ratio: Option<f64>,
}

/// Compare every test of `current` against `previous`.
pub fn compare(previous: Option<&RunRecord>, current: &RunRecord) -> Vec<Comparison> {
    current
        .benches
        .iter()
        .map(|bench| {
            let prev = previous
                .and_then(|run| run.measurement(&bench.name))
                .map(|m| m.value);
            let ratio = prev.and_then(|p| {
                let (num, den) = if bench.bigger_is_better {
                    (p, bench.value)
                } else {
                    (bench.value, p)
                };
                (den != 0.0).then(|| num / den)
            });
            Comparison {
                name: bench.name.clone(),
                unit: bench.unit.clone(),
                previous: prev,
                current: bench.value,
                ratio,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::make_run;

    #[test]
    fn test_reconstruct_groups_by_name_in_first_seen_order() {
        let runs = vec![
            make_run("a", 1, &[("TestCtor", 22.79), ("TestScan", 27.88)]),
            make_run("b", 2, &[("TestScan", 28.47), ("TestCtor", 23.01)]),
        ];
        let set = reconstruct(&runs);

        let names: Vec<_> = set.keys().map(String::as_str).collect();
        assert_eq!(names, ["TestCtor", "TestScan"]);
        assert_eq!(set["TestCtor"].values(), vec![22.79, 23.01]);
        assert_eq!(set["TestScan"].points[1].commit_id, "b");
        assert_eq!(set["TestScan"].points[1].date, 2);
    }

    #[test]
    fn test_reconstruct_leaves_gaps_for_missing_tests() {
        let runs = vec![
            make_run("a", 1, &[("TestCtor", 1.0), ("TestGetch", 5.0)]),
            make_run("b", 2, &[("TestCtor", 1.1)]),
            make_run("c", 3, &[("TestCtor", 1.2), ("TestGetch", 5.5)]),
        ];
        let set = reconstruct(&runs);
        let getch: Vec<_> = set["TestGetch"].points.iter().map(|p| p.date).collect();
        assert_eq!(getch, [1, 3]);
    }

    #[test]
    fn test_stats() {
        let stats = SeriesStats::from_values(&[4.0, 2.0, 6.0, 8.0]);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 8.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 6.0);
        assert_eq!(stats.p90, 8.0);
        assert_eq!(stats.sample_count, 4);
        assert!((stats.std_dev - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(SeriesStats::from_values(&[]), SeriesStats::default());
    }

    #[test]
    fn test_compare_orients_ratio() {
        let prev = make_run("a", 1, &[("TestCtor", 20.0), ("TestScan", 10.0)]);
        let mut cur = make_run("b", 2, &[("TestCtor", 30.0), ("TestScan", 20.0), ("TestNew", 1.0)]);
        cur.benches[1].bigger_is_better = true;

        let cmp = compare(Some(&prev), &cur);
        assert_eq!(cmp.len(), 3);
        assert_eq!(cmp[0].ratio, Some(1.5));
        assert_eq!(cmp[1].ratio, Some(0.5));
        assert_eq!(cmp[2].previous, None);
        assert_eq!(cmp[2].ratio, None);
    }

    #[test]
    fn test_compare_zero_baseline_has_no_ratio() {
        let prev = make_run("a", 1, &[("TestCtor", 0.0)]);
        let cur = make_run("b", 2, &[("TestCtor", 3.0)]);
        let cmp = compare(Some(&prev), &cur);
        assert_eq!(cmp[0].previous, Some(0.0));
        assert_eq!(cmp[0].ratio, None);
    }

    #[test]
    fn test_compare_without_baseline() {
        let cur = make_run("b", 2, &[("TestCtor", 3.0)]);
        let cmp = compare(None, &cur);
        assert!(cmp.iter().all(|c| c.previous.is_none()));
    }
}
