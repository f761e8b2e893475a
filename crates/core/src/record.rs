// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run records and the measurements they carry.
//!
//! A [`RunRecord`] is one CI execution of a benchmark suite: the commit it
//! ran against, when it was recorded, which harness format produced it and
//! the ordered list of [`Measurement`]s. Field names on the wire match the
//! history files exactly (`tree_id` is snake case, `biggerIsBetter` is not).

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

use crate::{Error, Result};

/// Author or committer of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitUser {
    /// E-mail address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Hosting-service login, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl CommitUser {
    /// Create a user without a login name.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            username: None,
        }
    }

    /// Set the login name.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Commit metadata attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit author.
    pub author: CommitUser,
    /// Commit committer.
    pub committer: CommitUser,
    /// Whether the commit was distinct in the push that triggered the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    /// Full commit hash.
    pub id: String,
    /// Commit message.
    pub message: String,
    /// RFC 3339 commit timestamp, kept verbatim.
    pub timestamp: String,
    /// Tree hash.
    pub tree_id: String,
    /// Link to the commit.
    pub url: String,
}

impl Commit {
    /// Parse [`Commit::timestamp`].
    pub fn committed_at(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).map_err(|source| Error::Timestamp {
            value: self.timestamp.clone(),
            source,
        })
    }

    /// Abbreviated commit hash.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(7) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// A single named result within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Test identifier.
    pub name: String,
    /// Measured value. Whole numbers are written without a fraction.
    #[serde(serialize_with = "serialize_value")]
    pub value: f64,
    /// Spread reported by the harness, e.g. `± 12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Unit label such as `ns/iter`.
    pub unit: String,
    /// Free-form extra information from the harness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Whether higher values are better.
    #[serde(default)]
    pub bigger_is_better: bool,
}

impl Measurement {
    /// Create a smaller-is-better measurement.
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            range: None,
            unit: unit.into(),
            extra: None,
            bigger_is_better: false,
        }
    }

    /// Set the orientation of the measurement.
    pub fn bigger_is_better(mut self, bigger_is_better: bool) -> Self {
        self.bigger_is_better = bigger_is_better;
        self
    }

    /// Attach a spread.
    pub fn range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Attach extra harness information.
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Check that the measurement can be stored and charted.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_measurement(&self.name, "name is empty"));
        }
        if !self.value.is_finite() {
            return Err(Error::invalid_measurement(
                &self.name,
                format!("value {} is not finite", self.value),
            ));
        }
        if self.unit.trim().is_empty() {
            return Err(Error::invalid_measurement(&self.name, "unit is empty"));
        }
        Ok(())
    }
}

// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn serialize_value<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// One CI execution of a benchmark suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Commit the suite ran against.
    pub commit: Commit,
    /// When the run was recorded, in epoch milliseconds.
    pub date: i64,
    /// Harness output format the measurements were parsed from.
    pub tool: String,
    /// Measurements in harness order.
    pub benches: Vec<Measurement>,
}

impl RunRecord {
    /// Create a new builder.
    pub fn builder() -> RunRecordBuilder {
        RunRecordBuilder::default()
    }

    /// [`RunRecord::date`] as a UTC timestamp.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.date)
    }

    /// Look up a measurement by test name.
    pub fn measurement(&self, name: &str) -> Option<&Measurement> {
        self.benches.iter().find(|m| m.name == name)
    }

    /// Validate every measurement of the run. Test names must be unique
    /// within a run.
    pub fn validate(&self) -> Result<()> {
        if self.commit.id.trim().is_empty() {
            return Err(Error::invalid_input("commit id is empty"));
        }
        if self.benches.is_empty() {
            return Err(Error::invalid_input("run has no measurements"));
        }
        let mut seen = HashSet::new();
        for bench in &self.benches {
            bench.validate()?;
            if !seen.insert(bench.name.as_str()) {
                return Err(Error::invalid_measurement(&bench.name, "duplicate test name"));
            }
        }
        Ok(())
    }
}

/// Builder for [`RunRecord`] instances.
#[derive(Default)]
pub struct RunRecordBuilder {
    commit: Option<Commit>,
    date: Option<i64>,
    tool: Option<String>,
    benches: Vec<Measurement>,
}

impl RunRecordBuilder {
    /// Set the commit (required).
    pub fn commit(mut self, commit: Commit) -> Self {
        self.commit = Some(commit);
        self
    }

    /// Set the recorded date in epoch milliseconds. Defaults to now.
    pub fn date(mut self, date: i64) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the tool identifier (required).
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Add one measurement.
    pub fn measurement(mut self, measurement: Measurement) -> Self {
        self.benches.push(measurement);
        self
    }

    /// Add several measurements, keeping their order.
    pub fn measurements(mut self, measurements: impl IntoIterator<Item = Measurement>) -> Self {
        self.benches.extend(measurements);
        self
    }

    /// Build the [`RunRecord`]. Returns `Err` if required fields are missing
    /// or a measurement is invalid.
    pub fn build(self) -> Result<RunRecord> {
        let commit = self
            .commit
            .ok_or_else(|| Error::invalid_input("commit is required"))?;
        let tool = self
            .tool
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::invalid_input("tool is required"))?;
        let date = self.date.unwrap_or_else(|| Utc::now().timestamp_millis());

        let record = RunRecord {
            commit,
            date,
            tool,
            benches: self.benches,
        };
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_commit(id: &str) -> Commit {
        Commit {
            author: CommitUser::new("devel", "dev@example.com").with_username("devel"),
            committer: CommitUser::new("Dev Eloper", "dev@users.noreply.example.com")
                .with_username("devel"),
            distinct: Some(true),
            id: id.to_string(),
            message: "Add performance tests to continuous integration\n\nSee #1987".to_string(),
            timestamp: "2022-03-07T12:53:44-08:00".to_string(),
            tree_id: "7da686bd1662079612215dc8b0f27437626720c3".to_string(),
            url: format!("https://example.com/repo/commit/{id}"),
        }
    }

    pub(crate) fn make_run(id: &str, date: i64, values: &[(&str, f64)]) -> RunRecord {
        RunRecord::builder()
            .commit(make_commit(id))
            .date(date)
            .tool("ndjson")
            .measurements(
                values
                    .iter()
                    .map(|(name, value)| Measurement::new(*name, *value, "ns/iter")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_commit() {
        let err = RunRecord::builder()
            .tool("ndjson")
            .measurement(Measurement::new("TestCtor", 1.0, "ns/iter"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("commit"));
    }

    #[test]
    fn test_builder_requires_measurements() {
        let err = RunRecord::builder()
            .commit(make_commit("abc"))
            .tool("ndjson")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no measurements"));
    }

    #[test]
    fn test_builder_defaults_date_to_now() {
        let before = Utc::now().timestamp_millis();
        let run = RunRecord::builder()
            .commit(make_commit("abc"))
            .tool("ndjson")
            .measurement(Measurement::new("TestCtor", 1.0, "ns/iter"))
            .build()
            .unwrap();
        assert!(run.date >= before);
    }

    #[test]
    fn test_measurement_rejects_nan() {
        let m = Measurement::new("TestScan", f64::NAN, "ns/iter");
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_measurement_rejects_empty_unit() {
        let m = Measurement::new("TestScan", 1.0, " ");
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_commit_timestamp_with_offsets() {
        let mut commit = make_commit("abc");
        let local = commit.committed_at().unwrap();
        assert_eq!(local.offset().local_minus_utc(), -8 * 3600);

        commit.timestamp = "2022-03-08T23:09:54Z".to_string();
        let utc = commit.committed_at().unwrap();
        assert_eq!(utc.offset().local_minus_utc(), 0);

        commit.timestamp = "yesterday".to_string();
        assert!(commit.committed_at().is_err());
    }

    #[test]
    fn test_short_id_and_summary() {
        let commit = make_commit("80ee559205dd165c2d647610376d6f9a06822ae4");
        assert_eq!(commit.short_id(), "80ee559");
        assert_eq!(
            commit.summary(),
            "Add performance tests to continuous integration"
        );
        assert_eq!(make_commit("abc").short_id(), "abc");
    }

    #[test]
    fn test_measurement_wire_names() {
        let json = r#"{"name":"TestCtor","value":22.7932,"unit":"ns/iter","biggerIsBetter":false}"#;
        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.name, "TestCtor");
        assert!(!m.bigger_is_better);
        assert_eq!(serde_json::to_string(&m).unwrap(), json);
    }

    #[test]
    fn test_whole_values_are_written_as_integers() {
        let m = Measurement::new("tests::bench_fib_10", 135.0, "ns/iter");
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"name":"tests::bench_fib_10","value":135,"unit":"ns/iter","biggerIsBetter":false}"#
        );

        let zero = Measurement::new("noop", -0.0, "ns/iter");
        assert!(serde_json::to_string(&zero).unwrap().contains(r#""value":0,"#));

        let huge = Measurement::new("huge", 1e300, "ns/iter");
        assert!(serde_json::to_string(&huge).unwrap().contains("1e300"));
    }

    #[test]
    fn test_builder_rejects_duplicate_test_names() {
        let err = RunRecord::builder()
            .commit(make_commit("abc"))
            .tool("ndjson")
            .measurement(Measurement::new("TestCtor", 1.0, "ns/iter"))
            .measurement(Measurement::new("TestCtor", 2.0, "ns/iter"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate test name"));
    }

    #[test]
    fn test_measurement_orientation_defaults_to_smaller_is_better() {
        let m: Measurement =
            serde_json::from_str(r#"{"name":"ops","value":3,"unit":"ops/s"}"#).unwrap();
        assert!(!m.bigger_is_better);
    }

    #[test]
    fn test_recorded_at() {
        let run = make_run("abc", 1646687702917, &[("TestCtor", 22.7932)]);
        let at = run.recorded_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1646687702917);
        assert_eq!(run.measurement("TestCtor").unwrap().value, 22.7932);
        assert!(run.measurement("TestScan").is_none());
    }
}
