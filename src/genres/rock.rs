// Rock Genre
// Guitar-key progressions, driving tempos; also the fallback genre

use super::types::*;

/// Create the rock genre
///
/// Characteristics:
/// - Major-key guitar progressions (E, G, A)
/// - Overdriven lead over clean rhythm guitar
/// - BPM: 100-180
pub fn rock_genre() -> GenreProfile {
    GenreProfile {
        name: "rock".to_string(),
        chord_progressions: progressions(&[
            &["E", "B", "C#m", "A"],
            &["G", "D", "Em", "C"],
            &["A", "D", "Bm", "F#m"],
        ]),
        drum_patterns: standard_drum_patterns(),
        bpm_range: (100, 180),
        melody_program: 29, // Overdriven Guitar
        chord_program: 27,  // Electric Guitar (clean)
    }
}
