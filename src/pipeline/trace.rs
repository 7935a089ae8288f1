// Generation trace
// Append-only JSONL log of batch progress, one line per stage event

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the trace inside the output directory
pub const TRACE_FILE_NAME: &str = "trace.jsonl";

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// What a trace entry reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Batch,
    Composition,
}

/// Outcome carried by a trace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Started,
    Completed,
    Failed,
}

/// A single line in the generation trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    pub stage: TraceStage,
    pub status: TraceStatus,

    /// 1-based composition number (composition stage only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<u32>,

    /// Fraction of the batch finished [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Optional structured data (paths, chord progression, error text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: TraceStage, status: TraceStatus, progress: f32, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            status,
            composition: None,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            data: None,
        }
    }

    pub fn for_composition(mut self, number: u32) -> Self {
        self.composition = Some(number);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Trace writer for one batch
///
/// A disabled trace accepts entries and drops them.
pub struct GenerationTrace {
    file_path: Option<PathBuf>,
}

impl GenerationTrace {
    /// Trace into `<dir>/trace.jsonl`
    pub fn in_dir(dir: &Path) -> Self {
        GenerationTrace {
            file_path: Some(dir.join(TRACE_FILE_NAME)),
        }
    }

    pub fn disabled() -> Self {
        GenerationTrace { file_path: None }
    }

    /// Trace into `<dir>/trace.jsonl`, dropping entries from earlier runs
    pub fn start_in_dir(dir: &Path) -> Result<Self, TraceError> {
        let trace = Self::in_dir(dir);
        if let Some(path) = &trace.file_path {
            std::fs::File::create(path)?;
        }
        Ok(trace)
    }

    /// Append an entry; creates the file if it doesn't exist
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(entry.to_json_line()?.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Append an entry, logging instead of failing
    ///
    /// Tracing never aborts generation.
    pub fn record(&self, entry: TraceEntry) {
        if let Err(e) = self.write(&entry) {
            log::warn!("Failed to write trace entry: {}", e);
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(TraceError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_trace_entry_creation() {
        let entry = TraceEntry::new(TraceStage::Composition, TraceStatus::Started, 0.5, "Composing")
            .for_composition(2);

        assert_eq!(entry.stage, TraceStage::Composition);
        assert_eq!(entry.status, TraceStatus::Started);
        assert_eq!(entry.composition, Some(2));
        assert_eq!(entry.progress, 0.5);
        assert!(entry.data.is_none());
    }

    #[test]
    fn test_progress_clamping() {
        let low = TraceEntry::new(TraceStage::Batch, TraceStatus::Started, -0.5, "x");
        assert_eq!(low.progress, 0.0);

        let high = TraceEntry::new(TraceStage::Batch, TraceStatus::Completed, 1.5, "x");
        assert_eq!(high.progress, 1.0);
    }

    #[test]
    fn test_json_line_format() {
        let entry = TraceEntry::new(TraceStage::Batch, TraceStatus::Failed, 0.3, "Boom")
            .with_data(serde_json::json!({ "error": "model exploded" }));
        let json_line = entry.to_json_line().unwrap();

        assert!(json_line.ends_with('\n'));
        assert!(json_line.contains("\"status\":\"failed\""));
        assert!(!json_line.contains("\"composition\""));

        let parsed: TraceEntry = serde_json::from_str(json_line.trim()).unwrap();
        assert_eq!(parsed.data.unwrap()["error"], "model exploded");
    }

    #[test]
    fn test_trace_appends() {
        let temp_dir = TempDir::new().unwrap();
        let trace = GenerationTrace::in_dir(temp_dir.path());

        trace.record(TraceEntry::new(TraceStage::Batch, TraceStatus::Started, 0.0, "Start"));
        trace.record(
            TraceEntry::new(TraceStage::Composition, TraceStatus::Completed, 1.0, "Done")
                .for_composition(1),
        );

        let entries = read_trace_file(&temp_dir.path().join(TRACE_FILE_NAME)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stage, TraceStage::Batch);
        assert_eq!(entries[1].composition, Some(1));
    }

    #[test]
    fn test_start_truncates_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        let earlier = GenerationTrace::in_dir(temp_dir.path());
        earlier.record(TraceEntry::new(TraceStage::Batch, TraceStatus::Started, 0.0, "Old"));
        earlier.record(TraceEntry::new(TraceStage::Batch, TraceStatus::Completed, 1.0, "Old"));

        let trace = GenerationTrace::start_in_dir(temp_dir.path()).unwrap();
        let path = temp_dir.path().join(TRACE_FILE_NAME);
        assert!(read_trace_file(&path).unwrap().is_empty());

        trace.record(TraceEntry::new(TraceStage::Batch, TraceStatus::Started, 0.0, "New"));
        let entries = read_trace_file(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "New");
    }

    #[test]
    fn test_disabled_trace_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let trace = GenerationTrace::disabled();

        trace.record(TraceEntry::new(TraceStage::Batch, TraceStatus::Started, 0.0, "Start"));

        assert!(trace.path().is_none());
        assert!(!temp_dir.path().join(TRACE_FILE_NAME).exists());
    }
}
