//! Full-scan construction of a [`Store`] from a history source.

use crate::error::{IndexError, Result};
use crate::index::store::{PreparedRow, Store};
use crate::index::types::{HistoryEntry, InitReport};
use crate::utils::progress::row_progress;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rows yielded by a source; each row may fail on its own
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>;

/// Enumerates every history row for a full scan
pub trait HistorySource {
    /// Start enumeration. An `Err` means the backend itself is unreadable.
    fn rows(&mut self) -> Result<RowIter<'_>>;
}

/// In-memory rows, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    entries: Vec<HistoryEntry>,
}

impl VecSource {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }
}

impl HistorySource for VecSource {
    fn rows(&mut self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.entries.iter().cloned().map(Ok::<_, IndexError>)))
    }
}

impl FromIterator<HistoryEntry> for VecSource {
    fn from_iter<I: IntoIterator<Item = HistoryEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One JSON object per line: `{"id": 1, "url": "...", "title": "...", ...}`
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl HistorySource for JsonlSource {
    fn rows(&mut self) -> Result<RowIter<'_>> {
        let unavailable =
            |reason: String| IndexError::BackendUnavailable(format!("{}: {}", self.path.display(), reason));
        let file = File::open(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| unavailable(e.to_string()))?;
        if !metadata.is_file() {
            return Err(unavailable("not a regular file".to_string()));
        }

        let path = self.path.display().to_string();
        let lines = BufReader::new(file).lines().enumerate();
        // Invalid UTF-8 spoils one line; any other read error ends the scan
        let rows = lines.scan(false, move |failed, (i, line)| {
            if *failed {
                return None;
            }
            let line_no = i + 1;
            Some(match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(parse_entry(&line, line_no)),
                Err(e) if e.kind() == ErrorKind::InvalidData => Some(Err(IndexError::MalformedRow {
                    line: line_no,
                    reason: e.to_string(),
                })),
                Err(e) => {
                    *failed = true;
                    Some(Err(IndexError::BackendUnavailable(format!(
                        "{path}: line {line_no}: {e}"
                    ))))
                }
            })
        });
        Ok(Box::new(rows.flatten()))
    }
}

fn parse_entry(line: &str, line_no: usize) -> Result<HistoryEntry> {
    let entry: HistoryEntry =
        serde_json::from_str(line).map_err(|e| IndexError::MalformedRow {
            line: line_no,
            reason: e.to_string(),
        })?;
    if entry.row.url.trim().is_empty() {
        return Err(IndexError::MalformedRow {
            line: line_no,
            reason: "empty url".to_string(),
        });
    }
    Ok(entry)
}

/// Scan `source` into a fresh store.
///
/// Rows are tokenized in parallel, then applied in source order so a later
/// row with a repeated id wins. Bad rows are skipped and counted. A backend
/// that is unreadable up front or fails mid-scan yields an empty store.
pub fn build_store(source: &mut dyn HistorySource, show_progress: bool) -> (Store, InitReport) {
    let mut report = InitReport::default();

    let rows = match source.rows() {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "history backend unavailable, starting with an empty index");
            report.backend_unavailable = true;
            return (Store::new(), report);
        }
    };

    let mut entries = Vec::new();
    for row in rows {
        match row {
            Ok(entry) => entries.push(entry),
            Err(err @ IndexError::BackendUnavailable(_)) => {
                warn!(error = %err, "history backend failed mid-scan, starting with an empty index");
                report.backend_unavailable = true;
                report.skipped = 0;
                return (Store::new(), report);
            }
            Err(err) => {
                debug!(error = %err, "skipping history row");
                report.skipped += 1;
            }
        }
    }

    let progress = row_progress(entries.len() as u64, show_progress);
    let prepared: Vec<PreparedRow> = entries
        .into_par_iter()
        .map(|entry| {
            let prepared = PreparedRow::new(entry.id, entry.row);
            progress.inc(1);
            prepared
        })
        .collect();
    progress.finish_and_clear();

    let mut store = Store::new();
    for row in prepared {
        store.apply(row);
    }
    report.indexed = store.len();

    info!(
        rows = report.indexed,
        skipped = report.skipped,
        words = store.stats().words,
        "history index built"
    );
    (store, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::Row;
    use std::io::Write;

    fn entry(id: u32, url: &str, title: &str) -> HistoryEntry {
        HistoryEntry {
            id,
            row: Row::new(url, title),
        }
    }

    #[test]
    fn test_build_from_vec_source() {
        let mut source: VecSource = vec![
            entry(1, "http://www.reuters.com/", "Reuters"),
            entry(2, "http://www.cnn.com/", "CNN"),
            entry(1, "http://www.reuters.com/world", "Reuters World"),
        ]
        .into_iter()
        .collect();

        let (store, report) = build_store(&mut source, false);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 0);
        assert!(!report.backend_unavailable);
        assert_eq!(store.row(1).unwrap().title, "Reuters World");
        store.validate().unwrap();
    }

    #[test]
    fn test_build_from_empty_source() {
        let (store, report) = build_store(&mut VecSource::default(), false);
        assert!(store.is_empty());
        assert_eq!(report, InitReport::default());
    }

    #[test]
    fn test_jsonl_skips_malformed_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": 1, "url": "http://a.com/", "title": "A", "visit_count": 2}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id": 2, "url": ""}}"#).unwrap();
        writeln!(file, r#"{{"id": 3, "url": "http://b.com/"}}"#).unwrap();
        file.flush().unwrap();

        let (store, report) = build_store(&mut JsonlSource::new(file.path()), false);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.row(1).unwrap().visit_count, 2);
    }

    #[test]
    fn test_missing_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = JsonlSource::new(&dir.path().join("missing.jsonl"));
        assert!(matches!(source.rows(), Err(IndexError::BackendUnavailable(_))));

        let (store, report) = build_store(&mut source, false);
        assert!(store.is_empty());
        assert!(report.backend_unavailable);
    }

    #[test]
    fn test_directory_backend_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = JsonlSource::new(dir.path());
        assert!(matches!(source.rows(), Err(IndexError::BackendUnavailable(_))));

        let (store, report) = build_store(&mut source, false);
        assert!(store.is_empty());
        assert!(report.backend_unavailable);
    }

    #[test]
    fn test_jsonl_invalid_utf8_skips_one_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"id\": 1, \"url\": \"http://a.com/\"}\n\xff\xfe\n").unwrap();
        writeln!(file, r#"{{"id": 2, "url": "http://b.com/"}}"#).unwrap();
        file.flush().unwrap();

        let (store, report) = build_store(&mut JsonlSource::new(file.path()), false);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
        assert!(!report.backend_unavailable);
        assert!(store.row(2).is_some());
    }

    struct FailingSource;

    impl HistorySource for FailingSource {
        fn rows(&mut self) -> Result<RowIter<'_>> {
            let rows = vec![
                Ok(entry(1, "http://www.reuters.com/", "Reuters")),
                Err(IndexError::BackendUnavailable("disk went away".to_string())),
                Ok(entry(2, "http://www.cnn.com/", "CNN")),
            ];
            Ok(Box::new(rows.into_iter()))
        }
    }

    #[test]
    fn test_mid_scan_failure_yields_empty_store() {
        let (store, report) = build_store(&mut FailingSource, false);
        assert!(store.is_empty());
        assert!(report.backend_unavailable);
        assert_eq!(report.indexed, 0);
    }
}
