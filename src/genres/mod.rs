// Genres Module
// Canned chord progressions, drum patterns and tempo ranges per genre

pub mod chords;
pub mod select;
pub mod types;
mod classical;
mod electronica;
mod jazz;
mod rock;

/// Genre whose tables stand in for unregistered genres
pub const DEFAULT_GENRE: &str = "rock";

/// Registered genre names, in listing order
pub const GENRE_NAMES: [&str; 4] = ["classical", "jazz", "rock", "electronica"];

/// Normalize free-text genre input for lookup
///
/// Trims and lower-cases; `electronic` is accepted as an alias of `electronica`.
pub fn normalize_genre_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        "electronic" => "electronica".to_string(),
        _ => name,
    }
}

/// Get a genre by name
pub fn get_genre(name: &str) -> Option<types::GenreProfile> {
    match normalize_genre_name(name).as_str() {
        "classical" => Some(classical::classical_genre()),
        "jazz" => Some(jazz::jazz_genre()),
        "rock" => Some(rock::rock_genre()),
        "electronica" => Some(electronica::electronica_genre()),
        _ => None,
    }
}

/// Get a genre by name, falling back to the default genre's tables
pub fn genre_or_default(name: &str) -> types::GenreProfile {
    get_genre(name).unwrap_or_else(|| {
        log::debug!(
            "Unknown genre '{}', using '{}' patterns",
            name,
            DEFAULT_GENRE
        );
        rock::rock_genre()
    })
}

/// Tempo range registered for a genre, or the default range
pub fn bpm_range_for(name: &str) -> (u32, u32) {
    get_genre(name)
        .map(|genre| genre.bpm_range)
        .unwrap_or(DEFAULT_BPM_RANGE)
}

/// List all available genres with summaries
pub fn list_genres() -> Vec<types::GenreSummary> {
    vec![
        classical::classical_genre().summary("Diatonic triads, piano over strings."),
        jazz::jazz_genre().summary("Seventh-chord changes, alto sax over electric piano."),
        rock::rock_genre().summary("Guitar-key progressions at driving tempos."),
        electronica::electronica_genre().summary("Minor four-chord loops, saw lead over pads."),
    ]
}

/// Get all genre names
pub fn list_genre_names() -> Vec<String> {
    GENRE_NAMES.iter().map(|name| name.to_string()).collect()
}

// Re-export main types
pub use chords::{ChordError, ChordQuality, ChordSymbol};
pub use select::{select_chord_progression, select_drum_pattern};
pub use types::{GenreProfile, GenreSummary, DEFAULT_BPM_RANGE, DRUM_REST};
