//! Append-only generation history.
//!
//! One JSON object per line in `{folder}/history.jsonl`. Entries never carry
//! credentials: the request's credential field is not serialisable.

use crate::data::{GenerationRequest, GenerationResult, HistorySink, LimitSpec, StyleRuleSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HISTORY_DIR: &str = ".billcopy";
const HISTORY_FILE: &str = "history.jsonl";

/// One recorded generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC 3339 time the result was recorded
    pub timestamp: String,
    /// Hash of source, rules and limits; equal fingerprints mean equal inputs
    pub fingerprint: String,
    pub source_text: String,
    pub style_rules: StyleRuleSet,
    pub limits: Vec<LimitSpec>,
    pub result: GenerationResult,
}

/// File-based implementation of HistorySink
#[derive(Debug, Clone)]
pub struct FileHistoryLog {
    path: PathBuf,
}

impl FileHistoryLog {
    /// Creates a new FileHistoryLog
    ///
    /// # Arguments
    /// * `path` - Optional path to the history file (defaults to ".billcopy/history.jsonl")
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(HISTORY_DIR).join(HISTORY_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry, oldest first. Lines that fail to parse are skipped.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history: {}", self.path.display()))?;

        let entries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<HistoryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable history line");
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let line = serde_json::to_string(entry).context("Failed to serialize history entry")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history: {}", self.path.display()))?;
        writeln!(file, "{}", line).context("Failed to write history entry")?;

        Ok(())
    }
}

impl HistorySink for FileHistoryLog {
    fn record(&self, request: &GenerationRequest, result: &GenerationResult) {
        let entry = HistoryEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            fingerprint: fingerprint(request),
            source_text: request.source_text.clone(),
            style_rules: request.style_rules.clone(),
            limits: request.limits.clone(),
            result: result.clone(),
        };

        match self.append(&entry) {
            Ok(()) => debug!(path = %self.path.display(), fingerprint = %entry.fingerprint, "Recorded generation"),
            Err(e) => {
                let detail = format!("{:#}", e);
                warn!(path = %self.path.display(), error = %detail, "Failed to record generation history");
            }
        }
    }
}

/// SHA-256 over the serialised request; credentials are not part of it
pub fn fingerprint(request: &GenerationRequest) -> String {
    let input_json = serde_json::to_string(request).unwrap_or_else(|_| "{}".to_string());
    let mut hasher = Sha256::new();
    hasher.update(input_json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Credentials, Unit, Variant};

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "A drama about a lighthouse keeper",
            StyleRuleSet::default(),
            vec![LimitSpec::characters("Short", 20)],
        )
    }

    fn result() -> GenerationResult {
        GenerationResult {
            variants: vec![Variant {
                label: "Short".to_string(),
                bound: 20,
                unit: Unit::Characters,
                text: "Lighthouse drama".to_string(),
            }],
            violations: Vec::new(),
            style_findings: Vec::new(),
        }
    }

    #[test]
    fn test_default_path() {
        let log = FileHistoryLog::new(None);
        assert_eq!(log.path(), Path::new(".billcopy/history.jsonl"));
    }

    #[test]
    fn test_record_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileHistoryLog::new(Some(dir.path().join("nested").join("history.jsonl")));

        log.record(&request(), &result());
        log.record(&request(), &result());

        let entries = log.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source_text, "A drama about a lighthouse keeper");
        assert_eq!(entries[0].result.value("Short"), "Lighthouse drama");
        assert_eq!(entries[0].fingerprint, entries[1].fingerprint);
    }

    #[test]
    fn test_credentials_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileHistoryLog::new(Some(dir.path().join("history.jsonl")));

        log.record(&request().with_credentials(Credentials::new("sk-secret")), &result());

        let raw = fs::read_to_string(log.path()).unwrap();
        assert!(!raw.contains("sk-secret"));
    }

    #[test]
    fn test_fingerprint_ignores_credentials_and_tracks_inputs() {
        let plain = fingerprint(&request());
        let with_key = fingerprint(&request().with_credentials(Credentials::new("sk-secret")));
        assert_eq!(plain, with_key);
        assert_eq!(plain.len(), 64);

        let mut other = request();
        other.limits[0].bound = 30;
        assert_ne!(plain, fingerprint(&other));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileHistoryLog::new(Some(dir.path().join("absent.jsonl")));
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let log = FileHistoryLog::new(Some(dir.path().to_path_buf()));
        log.record(&request(), &result());
    }
}
