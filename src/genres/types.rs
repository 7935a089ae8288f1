// Genre Type Definitions
// A genre bundles the canned harmony, rhythm and tempo defaults for a composition

use serde::{Deserialize, Serialize};

/// Tempo range used when a genre has no registered range of its own
pub const DEFAULT_BPM_RANGE: (u32, u32) = (80, 140);

/// General MIDI percussion note numbers used by the drum tables
pub const GM_KICK: u8 = 36;        // C1
pub const GM_CLOSED_HIHAT: u8 = 42; // F#1

/// Drum pattern step value meaning "no hit"
pub const DRUM_REST: u8 = 0;

/// Complete genre definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub name: String,

    /// Candidate chord progressions, one is picked per composition
    pub chord_progressions: Vec<Vec<String>>,

    /// Candidate one-bar drum patterns (GM percussion notes, 0 = rest)
    pub drum_patterns: Vec<Vec<u8>>,

    /// Inclusive BPM range sampled when no tempo is requested
    pub bpm_range: (u32, u32),

    /// GM program for the melody channel
    pub melody_program: u8,

    /// GM program for the chord channel
    pub chord_program: u8,
}

/// Genre summary for listing on the console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSummary {
    pub name: String,
    pub description: String,
    pub bpm_range: (u32, u32),
    pub progression_count: usize,
    pub drum_pattern_count: usize,
}

impl GenreProfile {
    /// Get a summary of this genre for display
    pub fn summary(&self, description: &str) -> GenreSummary {
        GenreSummary {
            name: self.name.clone(),
            description: description.to_string(),
            bpm_range: self.bpm_range,
            progression_count: self.chord_progressions.len(),
            drum_pattern_count: self.drum_patterns.len(),
        }
    }

    /// Check whether a tempo falls inside this genre's range
    pub fn accepts_bpm(&self, bpm: u32) -> bool {
        bpm >= self.bpm_range.0 && bpm <= self.bpm_range.1
    }
}

/// Build a progression table from string literals
pub(crate) fn progressions(table: &[&[&str]]) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|chords| chords.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// The two backbeat patterns every built-in genre shares
pub(crate) fn standard_drum_patterns() -> Vec<Vec<u8>> {
    vec![
        vec![GM_KICK, DRUM_REST, GM_CLOSED_HIHAT, DRUM_REST, GM_KICK, DRUM_REST, GM_CLOSED_HIHAT, DRUM_REST],
        vec![GM_KICK, GM_CLOSED_HIHAT, DRUM_REST, GM_KICK, DRUM_REST, GM_CLOSED_HIHAT, GM_KICK, DRUM_REST],
    ]
}
