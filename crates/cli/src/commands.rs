//! Subcommand implementations.

use anyhow::Context;
use benchtrail_adapters::parser_for;
use benchtrail_core::{reconstruct, AppendOptions, Commit, RunRecord, SeriesSet};
use benchtrail_datafile::{io, markdown};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{CliError, Commands, Settings};

/// Execute one parsed command.
pub fn dispatch(command: Commands, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Commands::Append {
            data,
            tool,
            output_file,
            commit_file,
            suite,
            max_items,
            date,
            repo_url,
            compare,
        } => append(
            settings,
            AppendArgs {
                data,
                tool,
                output_file,
                commit_file,
                suite,
                max_items,
                date,
                repo_url,
                compare,
            },
        ),
        Commands::Validate { files } => validate(&files),
        Commands::Series {
            data,
            suite,
            test,
            output,
        } => series(settings, &data, suite, test.as_deref(), output.as_deref()),
        Commands::Report {
            data,
            suite,
            output,
        } => report(&data, suite.as_deref(), output.as_deref()),
        Commands::Prune {
            data,
            max_items,
            suite,
        } => prune(settings, &data, max_items, suite),
        Commands::List { root } => list(&root),
        Commands::Status { detailed } => {
            status(settings, detailed);
            Ok(())
        }
    }
}

/// Arguments of the `append` command.
#[derive(Debug, Clone)]
pub struct AppendArgs {
    /// History file.
    pub data: PathBuf,
    /// Harness output format.
    pub tool: String,
    /// Harness output file.
    pub output_file: PathBuf,
    /// Commit metadata file.
    pub commit_file: PathBuf,
    /// Suite override.
    pub suite: Option<String>,
    /// Cap override.
    pub max_items: Option<usize>,
    /// Recorded date override.
    pub date: Option<i64>,
    /// Repository URL override.
    pub repo_url: Option<String>,
    /// Print a comparison with the baseline.
    pub compare: bool,
}

/// Parse harness output and append it as a new run.
pub fn append(settings: &Settings, args: AppendArgs) -> anyhow::Result<()> {
    let suite = args.suite.unwrap_or_else(|| settings.suite.clone());
    let parser = parser_for(&args.tool)?;

    let output = fs::read_to_string(&args.output_file)
        .with_context(|| format!("reading harness output {}", args.output_file.display()))?;
    let benches = parser.parse(&output)?;
    let commit = read_commit(&args.commit_file)?;

    let mut builder = RunRecord::builder()
        .commit(commit)
        .tool(parser.tool())
        .measurements(benches);
    if let Some(date) = args.date {
        builder = builder.date(date);
    }
    let record = builder.build()?;

    let repo_url = args.repo_url.or_else(|| settings.repo_url.clone());
    let mut data = io::read_or_init(&args.data, repo_url.as_deref().unwrap_or_default())?;
    let options = AppendOptions {
        max_items: args.max_items.or(settings.max_items),
        repo_url,
    };

    let short_id = record.commit.short_id().to_string();
    let outcome = data.append_run(&suite, record, &options)?;
    io::write_data_file(&args.data, &data)?;

    info!(
        path = %args.data.display(),
        suite = %suite,
        commit = %short_id,
        "History updated"
    );
    println!(
        "{} run {} to suite '{}' ({} runs{})",
        "Appended".green().bold(),
        short_id,
        suite,
        outcome.index + 1,
        if outcome.dropped > 0 {
            format!(", dropped {}", outcome.dropped)
        } else {
            String::new()
        }
    );

    if args.compare {
        if let Some(current) = data.latest(&suite) {
            let previous = data.previous_run(&suite, &current.commit.id);
            println!();
            print!("{}", markdown::generate_comparison(&suite, previous, current));
        }
    }
    Ok(())
}

/// Read commit metadata from a commit object or a push event payload.
pub fn read_commit(path: &Path) -> anyhow::Result<Commit> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading commit file {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing commit file {}", path.display()))?;
    let head = value.get_mut("head_commit").map(serde_json::Value::take);
    if let Some(head) = head {
        value = head;
    }
    serde_json::from_value(value)
        .with_context(|| format!("commit file {} has no usable commit", path.display()))
}

/// Validate each file; fails when any file has errors.
pub fn validate(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in files {
        let data = match io::read_data_file(path) {
            Ok(data) => data,
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "FAIL".red().bold(), path.display(), e);
                continue;
            }
        };

        let report = data.validate();
        for warning in &report.warnings {
            warn!(path = %path.display(), "{warning}");
            println!("  {} {}", "warning:".yellow(), warning);
        }
        for error in &report.errors {
            println!("  {} {}", "error:".red(), error);
        }

        if report.is_valid() {
            println!(
                "{} {} ({} suites, {} runs)",
                "OK".green().bold(),
                path.display(),
                report.suites,
                report.runs
            );
        } else {
            failed += 1;
            println!(
                "{} {} ({} errors)",
                "FAIL".red().bold(),
                path.display(),
                report.errors.len()
            );
        }
    }

    if failed > 0 {
        return Err(CliError::ValidationFailed(failed).into());
    }
    Ok(())
}

/// Export time series of one suite.
pub fn series(
    settings: &Settings,
    path: &Path,
    suite: Option<String>,
    test: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let suite = suite.unwrap_or_else(|| settings.suite.clone());
    let data = io::read_data_file(path)?;
    let runs = data
        .suite(&suite)
        .ok_or_else(|| CliError::NotFound(format!("suite '{suite}' in {}", path.display())))?;

    let mut set = reconstruct(runs);
    if let Some(test) = test {
        let one = set
            .shift_remove(test)
            .ok_or_else(|| CliError::NotFound(format!("test '{test}' in suite '{suite}'")))?;
        set = SeriesSet::from([(test.to_string(), one)]);
    }

    match output {
        Some(out) => {
            io::write_series_json(&set, out)?;
            println!("Wrote {} series to {}", set.len(), out.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&set)?),
    }
    Ok(())
}

/// Markdown summary plus a comparison of each suite's latest run.
pub fn report(path: &Path, suite: Option<&str>, output: Option<&Path>) -> anyhow::Result<()> {
    let mut data = io::read_data_file(path)?;
    if let Some(suite) = suite {
        if !data.entries.contains_key(suite) {
            return Err(CliError::NotFound(format!("suite '{suite}' in {}", path.display())).into());
        }
        data.entries.retain(|name, _| name == suite);
    }

    let mut text = markdown::generate_summary(&data);
    for name in data.suite_names() {
        if let Some(current) = data.latest(name) {
            let previous = data.previous_run(name, &current.commit.id);
            text.push('\n');
            text.push_str(&markdown::generate_comparison(name, previous, current));
        }
    }

    match output {
        Some(out) => {
            fs::write(out, &text).with_context(|| format!("writing report {}", out.display()))?;
            println!("Report written to {}", out.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Cap a suite and rewrite the file.
pub fn prune(
    settings: &Settings,
    path: &Path,
    max_items: Option<usize>,
    suite: Option<String>,
) -> anyhow::Result<()> {
    let max_items = max_items
        .or(settings.max_items)
        .ok_or(CliError::Missing("max_items (pass --max-items or set it in config)"))?;
    let suite = suite.unwrap_or_else(|| settings.suite.clone());

    let mut data = io::read_data_file(path)?;
    let dropped = data.prune(&suite, max_items)?;
    if dropped > 0 {
        io::write_data_file(path, &data)?;
    }
    println!(
        "Suite '{}': dropped {} run(s), {} kept",
        suite,
        dropped,
        data.suite(&suite).map_or(0, <[_]>::len)
    );
    Ok(())
}

/// Print every history file under a results root.
pub fn list(root: &Path) -> anyhow::Result<()> {
    let entries = io::discover(root)?;
    if entries.is_empty() {
        println!("No data files under {}", root.display());
        return Ok(());
    }

    for entry in entries {
        match io::read_data_file(&entry.path) {
            Ok(data) => {
                let suites: Vec<String> = data
                    .entries
                    .iter()
                    .map(|(name, runs)| format!("{name}: {} runs", runs.len()))
                    .collect();
                println!("{}  {}", entry.label.bold(), suites.join(", "));
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "Unreadable data file");
                println!("{}  {}", entry.label.bold(), e.to_string().red());
            }
        }
    }
    Ok(())
}

/// Print the effective configuration.
pub fn status(settings: &Settings, detailed: bool) {
    println!("benchtrail");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Suite: {}", settings.suite);
    println!(
        "Max items: {}",
        settings
            .max_items
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
    );

    if detailed {
        println!("Repository URL: {}", settings.repo_url.as_deref().unwrap_or("-"));
        println!("Log level: {}", settings.log_level);
        println!(
            "Supported tools: {}",
            benchtrail_adapters::supported_tools().join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const COMMIT: &str = r#"{
  "author": {"email": "dev@example.com", "name": "devel", "username": "devel"},
  "committer": {"email": "dev@example.com", "name": "Dev Eloper", "username": "devel"},
  "distinct": true,
  "id": "80ee559205dd165c2d647610376d6f9a06822ae4",
  "message": "Speed up scanning",
  "timestamp": "2022-03-07T12:53:44-08:00",
  "tree_id": "7da686bd1662079612215dc8b0f27437626720c3",
  "url": "https://example.com/repo/commit/80ee559205dd165c2d647610376d6f9a06822ae4"
}"#;

    const NDJSON: &str = r#"{"name":"TestCtor","value":22.7932,"unit":"ns/iter","biggerIsBetter":false}
{"name":"TestScan","value":27.8855,"unit":"ns/iter","biggerIsBetter":false}
"#;

    fn fixture() -> (TempDir, AppendArgs) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("commit.json"), COMMIT).unwrap();
        fs::write(dir.path().join("out.ndjson"), NDJSON).unwrap();
        let args = AppendArgs {
            data: dir.path().join("results/TestNames_Latin/data.js"),
            tool: "ndjson".to_string(),
            output_file: dir.path().join("out.ndjson"),
            commit_file: dir.path().join("commit.json"),
            suite: None,
            max_items: None,
            date: Some(1646687702917),
            repo_url: Some("https://example.com/repo".to_string()),
            compare: false,
        };
        (dir, args)
    }

    #[test]
    fn test_append_creates_and_extends_history() {
        let (_dir, args) = fixture();
        let settings = Settings::default();

        append(&settings, args.clone()).unwrap();
        let mut second = args.clone();
        second.date = Some(1646781983104);
        second.compare = true;
        append(&settings, second).unwrap();

        let data = io::read_data_file(&args.data).unwrap();
        let runs = data.suite("Benchmark").unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].tool, "ndjson");
        assert_eq!(runs[1].benches[1].name, "TestScan");
        assert_eq!(data.repo_url, "https://example.com/repo");
    }

    #[test]
    fn test_append_rejects_older_date() {
        let (_dir, args) = fixture();
        let settings = Settings::default();
        append(&settings, args.clone()).unwrap();

        let mut older = args.clone();
        older.date = Some(1);
        let err = append(&settings, older).unwrap_err();
        assert!(err.downcast_ref::<benchtrail_core::Error>().is_some());
        assert_eq!(io::read_data_file(&args.data).unwrap().run_count(), 1);
    }

    #[test]
    fn test_append_honours_configured_cap() {
        let (_dir, args) = fixture();
        let settings = Settings {
            max_items: Some(1),
            ..Settings::default()
        };
        append(&settings, args.clone()).unwrap();
        let mut second = args.clone();
        second.date = Some(1646781983104);
        append(&settings, second).unwrap();

        let data = io::read_data_file(&args.data).unwrap();
        assert_eq!(data.suite("Benchmark").unwrap().len(), 1);
        assert_eq!(data.latest("Benchmark").unwrap().date, 1646781983104);
    }

    #[test]
    fn test_unknown_tool() {
        let (_dir, mut args) = fixture();
        args.tool = "pytest".to_string();
        let err = append(&Settings::default(), args).unwrap_err();
        assert_eq!(crate::exit_code(&err), 4);
    }

    #[test]
    fn test_read_commit_from_push_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("event.json");
        fs::write(&path, format!("{{\"ref\": \"refs/heads/main\", \"head_commit\": {COMMIT}}}")).unwrap();
        let commit = read_commit(&path).unwrap();
        assert_eq!(commit.short_id(), "80ee559");
        assert_eq!(commit.distinct, Some(true));
    }

    #[test]
    fn test_validate_and_prune() {
        let (_dir, args) = fixture();
        let settings = Settings::default();
        append(&settings, args.clone()).unwrap();
        let mut second = args.clone();
        second.date = Some(1646781983104);
        append(&settings, second).unwrap();

        validate(&[args.data.clone()]).unwrap();

        assert!(prune(&settings, &args.data, None, None).is_err());
        prune(&settings, &args.data, Some(1), None).unwrap();
        assert_eq!(io::read_data_file(&args.data).unwrap().run_count(), 1);
    }

    #[test]
    fn test_missing_suite_exit_code_matches_across_commands() {
        let (_dir, args) = fixture();
        let settings = Settings::default();
        append(&settings, args.clone()).unwrap();

        let pruned = prune(&settings, &args.data, Some(1), Some("Nope".into())).unwrap_err();
        let exported = series(&settings, &args.data, Some("Nope".into()), None, None).unwrap_err();
        assert_eq!(crate::exit_code(&pruned), 1);
        assert_eq!(crate::exit_code(&pruned), crate::exit_code(&exported));
    }

    #[test]
    fn test_validate_fails_on_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        fs::write(&path, "var x = 1;").unwrap();
        let err = validate(&[path]).unwrap_err();
        assert_eq!(crate::exit_code(&err), 4);
    }

    #[test]
    fn test_series_and_report_outputs() {
        let (dir, args) = fixture();
        let settings = Settings::default();
        append(&settings, args.clone()).unwrap();

        let series_path = dir.path().join("series.json");
        series(&settings, &args.data, None, Some("TestScan"), Some(series_path.as_path())).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&series_path).unwrap()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert_eq!(value["TestScan"]["points"][0]["value"], 27.8855);

        assert!(series(&settings, &args.data, None, Some("TestNope"), None).is_err());
        assert!(series(&settings, &args.data, Some("Nope".into()), None, None).is_err());

        let report_path = dir.path().join("report.md");
        report(&args.data, None, Some(report_path.as_path())).unwrap();
        let text = fs::read_to_string(&report_path).unwrap();
        assert!(text.contains("## Comparison: Benchmark"));
        assert!(text.contains("No baseline run"));
    }

    #[test]
    fn test_list_scans_tree() {
        let (dir, args) = fixture();
        append(&Settings::default(), args).unwrap();
        list(&dir.path().join("results")).unwrap();
    }
}
