// Electronica Genre
// Minor-key loops, synth lead over warm pad

use super::types::*;

/// Create the electronica genre
///
/// Characteristics:
/// - Four-chord minor loops (vi-IV-V-I family)
/// - Sawtooth lead, warm pad
/// - BPM: 120-200
pub fn electronica_genre() -> GenreProfile {
    GenreProfile {
        name: "electronica".to_string(),
        chord_progressions: progressions(&[
            &["Am", "F", "G", "C"],
            &["Dm", "Bb", "F", "C"],
            &["Em", "C", "G", "D"],
        ]),
        drum_patterns: standard_drum_patterns(),
        bpm_range: (120, 200),
        melody_program: 81, // Lead 2 (sawtooth)
        chord_program: 89,  // Pad 2 (warm)
    }
}
