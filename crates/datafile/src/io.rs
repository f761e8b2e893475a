//! I/O operations for benchmark history files.
//!
//! This module reads and writes `data.js` files and locates them in a
//! results tree laid out as `<root>/<suite dir>/.../data.js`.

use benchtrail_core::{BenchmarkData, SeriesSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::codec;
use crate::{Error, Result};

/// File name of a history file.
pub const DATA_FILE_NAME: &str = "data.js";

/// A history file found by [`discover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// Directory of the file relative to the scanned root, `/`-separated.
    pub label: String,
}

/// Read and decode a history file.
pub fn read_data_file(path: impl AsRef<Path>) -> Result<BenchmarkData> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let data = codec::decode(&content)?;
    debug!(path = %path.display(), runs = data.run_count(), "Read data file");
    Ok(data)
}

/// Read a history file, or start an empty one when it does not exist yet.
pub fn read_or_init(path: impl AsRef<Path>, repo_url: &str) -> Result<BenchmarkData> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(_) => read_data_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Data file missing, starting a new history");
            Ok(BenchmarkData::new(repo_url))
        }
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Encode and write a history file.
///
/// The content goes to a sibling temporary file first and is then renamed
/// over the target, so a reader sees either the old or the new document.
pub fn write_data_file(path: impl AsRef<Path>, data: &BenchmarkData) -> Result<()> {
    let path = path.as_ref();
    let text = codec::encode(data)?;
    write_atomic(path, text.as_bytes())?;
    debug!(path = %path.display(), runs = data.run_count(), "Wrote data file");
    Ok(())
}

/// Write reconstructed series as pretty JSON.
pub fn write_series_json(series: &SeriesSet, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(series)?;
    write_atomic(path.as_ref(), json.as_bytes())
}

/// Find every history file below `root`, sorted by path.
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<DataFileEntry>> {
    let root = root.as_ref();
    let mut found = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() != DATA_FILE_NAME {
            continue;
        }
        let path = entry.into_path();
        let label = path
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        found.push(DataFileEntry { path, label });
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::SAMPLE;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_preserves_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/suite/data.js");

        let data = codec::decode(SAMPLE).unwrap();
        write_data_file(&path, &data).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        assert_eq!(read_data_file(&path).unwrap(), data);
        assert!(!path.with_file_name("data.js.tmp").exists());
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        let err = read_data_file(&path).unwrap_err();
        assert!(err.to_string().contains("data.js"));
    }

    #[test]
    fn test_read_or_init_starts_empty() {
        let dir = tempdir().unwrap();
        let data = read_or_init(dir.path().join("data.js"), "https://example.com/repo").unwrap();
        assert_eq!(data.repo_url, "https://example.com/repo");
        assert_eq!(data.run_count(), 0);
    }

    #[test]
    fn test_read_or_init_fails_on_unreadable_path() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("results");
        fs::write(&blocker, "not a directory").unwrap();

        let err = read_or_init(blocker.join("data.js"), "https://example.com/repo").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_discover_finds_nested_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for sub in ["ustrperf/TestNames_Latin", "ustrperf/TestNames_Japanese_k"] {
            fs::create_dir_all(root.join(sub)).unwrap();
            fs::write(root.join(sub).join("data.js"), SAMPLE).unwrap();
        }
        fs::write(root.join("ustrperf/README.md"), "notes").unwrap();

        let found = discover(root).unwrap();
        let labels: Vec<_> = found.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            ["ustrperf/TestNames_Japanese_k", "ustrperf/TestNames_Latin"]
        );
    }

    #[test]
    fn test_write_series_json() {
        let dir = tempdir().unwrap();
        let data = codec::decode(SAMPLE).unwrap();
        let series = benchtrail_core::reconstruct(data.suite("Benchmark").unwrap());
        let path = dir.path().join("series.json");

        write_series_json(&series, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["TestCtor"]["points"][0]["value"], 22.7932);
    }
}
