// Data models for generation runs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::storage::StorageResult;

/// File name of the run manifest inside the output directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub genre: String,
    pub tempo: u32,
    pub steps_per_composition: u32,
    pub temperature: f64,
    pub backend: String,
    pub compositions: Vec<CompositionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionRecord {
    pub index: u32,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
    pub chord_progression: Vec<String>,
    pub drum_pattern: Vec<u8>,
    pub melody_notes: usize,
}

impl RunManifest {
    pub fn new(
        genre: impl Into<String>,
        tempo: u32,
        steps_per_composition: u32,
        temperature: f64,
        backend: impl Into<String>,
    ) -> Self {
        RunManifest {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            genre: genre.into(),
            tempo,
            steps_per_composition,
            temperature,
            backend: backend.into(),
            compositions: Vec::new(),
        }
    }

    pub fn record(&mut self, record: CompositionRecord) {
        self.compositions.push(record);
    }

    /// Paths of every recorded composition, in generation order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.compositions.iter().map(|c| c.path.clone()).collect()
    }

    /// Write as pretty JSON to `<dir>/manifest.json`
    pub fn write(&self, dir: &Path) -> StorageResult<PathBuf> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> StorageResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
