// Jazz Genre
// Seventh chords, sax lead over electric piano

use super::types::*;

/// Create the jazz genre
///
/// Characteristics:
/// - Extended chords (maj7, m7, dominant 7)
/// - Alto sax melody, electric piano comping
/// - BPM: 80-160
pub fn jazz_genre() -> GenreProfile {
    GenreProfile {
        name: "jazz".to_string(),
        chord_progressions: progressions(&[
            &["Cmaj7", "Dm7", "Em7", "A7"],
            &["Fmaj7", "Bb7", "Eb", "Am7"],
            &["Gmaj7", "C7", "Dm7", "Em7"],
        ]),
        drum_patterns: standard_drum_patterns(),
        bpm_range: (80, 160),
        melody_program: 65, // Alto Sax
        chord_program: 4,   // Electric Piano 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jazz_genre() {
        let genre = jazz_genre();

        assert_eq!(genre.name, "jazz");
        assert_eq!(genre.bpm_range, (80, 160));
        assert_eq!(genre.chord_progressions[1], vec!["Fmaj7", "Bb7", "Eb", "Am7"]);
        assert!(genre.chord_progressions.iter().all(|p| p.len() == 4));
    }
}
