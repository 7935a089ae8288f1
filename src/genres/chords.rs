// Chord Symbols - Parse chord names like "C#m" or "Bb7" and voice them as MIDI notes

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while reading chord symbols
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChordError {
    #[error("Empty chord symbol")]
    Empty,

    #[error("Invalid chord root in '{0}'")]
    InvalidRoot(String),

    #[error("Unsupported chord quality '{quality}' in '{symbol}'")]
    UnsupportedQuality { symbol: String, quality: String },
}

/// Chord quality (triad or seventh shape)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Suspended4,
}

impl ChordQuality {
    /// Semitone offsets from the chord root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Suspended4 => &[0, 5, 7],
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "maj" => Some(ChordQuality::Major),
            "m" | "min" => Some(ChordQuality::Minor),
            "7" => Some(ChordQuality::Dominant7),
            "maj7" | "M7" => Some(ChordQuality::Major7),
            "m7" | "min7" => Some(ChordQuality::Minor7),
            "dim" => Some(ChordQuality::Diminished),
            "sus4" | "sus" => Some(ChordQuality::Suspended4),
            _ => None,
        }
    }
}

/// A parsed chord symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSymbol {
    /// Root pitch class (0 = C, 11 = B)
    pub root: u8,
    pub quality: ChordQuality,
}

impl ChordSymbol {
    /// Chord tones voiced upward from the octave starting at `base_note`
    ///
    /// `base_note` should be a C (e.g. 48 = C3); notes above 127 are dropped.
    pub fn voice(&self, base_note: u8) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|&interval| base_note as u16 + self.root as u16 + interval as u16)
            .filter(|&note| note < 128)
            .map(|note| note as u8)
            .collect()
    }

    /// Pitch classes of every chord tone
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|&interval| (self.root + interval) % 12)
            .collect()
    }
}

impl FromStr for ChordSymbol {
    type Err = ChordError;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        let symbol = symbol.trim();
        let mut chars = symbol.chars();
        let letter = chars.next().ok_or(ChordError::Empty)?;

        let natural = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(ChordError::InvalidRoot(symbol.to_string())),
        };

        let rest = chars.as_str();
        let (root, suffix) = if let Some(suffix) = rest.strip_prefix('#') {
            ((natural + 1) % 12, suffix)
        } else if let Some(suffix) = rest.strip_prefix('b') {
            ((natural + 11) % 12, suffix)
        } else {
            (natural, rest)
        };

        let quality =
            ChordQuality::from_suffix(suffix).ok_or_else(|| ChordError::UnsupportedQuality {
                symbol: symbol.to_string(),
                quality: suffix.to_string(),
            })?;

        Ok(ChordSymbol { root, quality })
    }
}
