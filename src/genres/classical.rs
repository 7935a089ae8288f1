// Classical Genre
// Diatonic triads, strings and piano, moderate tempos

use super::types::*;

/// Create the classical genre
///
/// Characteristics:
/// - Plain major/minor triads (I-V-vi-IV and relatives)
/// - Piano melody over string chords
/// - BPM: 60-120
pub fn classical_genre() -> GenreProfile {
    GenreProfile {
        name: "classical".to_string(),
        chord_progressions: progressions(&[
            &["C", "G", "Am", "F"],
            &["Em", "Am", "F", "G"],
            &["D", "Bm", "G", "A"],
        ]),
        drum_patterns: standard_drum_patterns(),
        bpm_range: (60, 120),
        melody_program: 0,  // Acoustic Grand Piano
        chord_program: 48,  // String Ensemble 1
    }
}
