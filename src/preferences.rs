// Preference Resolution - Turn optional user genre/tempo into concrete values
// Missing values are filled from randomized defaults and per-genre tempo ranges

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genres::{self, GENRE_NAMES};

/// Errors raised while reading user preferences
///
/// None of these abort a run; callers log them and fall back to defaults.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Invalid tempo input: '{0}'")]
    InvalidTempoInput(String),

    #[error("Unknown genre: '{0}'")]
    UnknownGenre(String),
}

/// Concrete genre and tempo for a batch of compositions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPreferences {
    pub genre: String,
    pub tempo: u32,
}

/// Resolve optional genre/tempo preferences
///
/// - Absent or blank genre: uniform choice among the registered genres.
/// - Absent or non-positive tempo: uniform integer in the resolved genre's
///   BPM range (default range for unregistered genres).
///
/// Unregistered genres are kept as given (normalized) so they still name
/// the output files; pattern lookup falls back later.
pub fn resolve_preferences<R: Rng + ?Sized>(
    requested_genre: Option<&str>,
    requested_tempo: Option<i64>,
    rng: &mut R,
) -> ResolvedPreferences {
    let genre = match requested_genre.map(str::trim).filter(|g| !g.is_empty()) {
        Some(requested) => {
            let normalized = genres::normalize_genre_name(requested);
            if genres::get_genre(&normalized).is_none() {
                log::warn!("{}; default tables will be used", PreferenceError::UnknownGenre(normalized.clone()));
            }
            normalized
        }
        None => random_genre(rng),
    };

    let tempo = match requested_tempo
        .filter(|&t| t > 0)
        .and_then(|t| u32::try_from(t).ok())
    {
        Some(tempo) => tempo,
        None => {
            let (min_bpm, max_bpm) = genres::bpm_range_for(&genre);
            rng.gen_range(min_bpm..=max_bpm)
        }
    };

    log::debug!("Resolved preferences: genre={}, tempo={}", genre, tempo);

    ResolvedPreferences { genre, tempo }
}

fn random_genre<R: Rng + ?Sized>(rng: &mut R) -> String {
    GENRE_NAMES
        .choose(rng)
        .unwrap_or(&genres::DEFAULT_GENRE)
        .to_string()
}

/// Parse console tempo input
///
/// Blank input means "no preference" and yields `Ok(None)`.
pub fn parse_tempo_input(text: &str) -> Result<Option<i64>, PreferenceError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    text.parse::<i64>()
        .map(Some)
        .map_err(|_| PreferenceError::InvalidTempoInput(text.to_string()))
}

/// Parse console tempo input, logging and discarding invalid values
pub fn tempo_from_input(text: &str) -> Option<i64> {
    match parse_tempo_input(text) {
        Ok(tempo) => tempo,
        Err(e) => {
            log::warn!("{}; a random tempo will be used", e);
            None
        }
    }
}

/// Parse console genre input (blank means "no preference")
pub fn genre_from_input(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
