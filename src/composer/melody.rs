// Melody Generation - Generator abstraction and the built-in chord-tone backend
// Supports multiple generator backends: ChordTones (built-in) and External (model process)

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genres::chords::ChordSymbol;
use super::drum_track::DrumTrack;
use super::sequence::{NoteSequence, SequenceNote, TrackRole, STEPS_PER_QUARTER};

/// Errors that can occur during melody generation
#[derive(Debug, Error)]
pub enum MelodyError {
    #[error("Invalid melody request: {0}")]
    InvalidRequest(String),

    #[error("Model process I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model process exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("Malformed model output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Everything a generator is given for one composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyRequest {
    /// Model identifier forwarded to external backends
    pub model_name: String,

    /// Sampling temperature; higher is more random
    pub temperature: f64,

    /// Length of the melody in steps
    pub steps: u32,

    pub drum_track: DrumTrack,
    pub genre: String,
    pub tempo: u32,
    pub chord_progression: Vec<String>,

    /// Optional seed material to continue from
    pub primer: Option<NoteSequence>,
}

impl MelodyRequest {
    fn validate(&self) -> Result<(), MelodyError> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(MelodyError::InvalidRequest(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if self.chord_progression.is_empty() {
            return Err(MelodyError::InvalidRequest(
                "chord progression is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A source of melodies
///
/// Implementations return a sequence whose notes carry `TrackRole::Melody`.
pub trait MelodyGenerator {
    fn generate(&mut self, request: &MelodyRequest) -> Result<NoteSequence, MelodyError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Melody generator backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MelodyBackend {
    /// Built-in stochastic walk over chord tones
    #[default]
    ChordTones,

    /// External model process speaking JSON on stdin/stdout
    External,
}

/// Lowest melody pitch (C4)
const MELODY_LOW: u8 = 60;

/// Highest melody pitch (C6)
const MELODY_HIGH: u8 = 84;

/// Pitch the walk starts from (G4)
const MELODY_START: u8 = 67;

/// Rest probability at temperature 1.0
const BASE_REST_PROBABILITY: f64 = 0.2;

/// Leap size (semitones) whose weight falls by 1/e at temperature 1.0
const LEAP_SCALE: f64 = 3.0;

/// Note lengths in steps; repeats weight the draw
const DURATIONS: [u32; 7] = [1, 2, 2, 4, 4, 4, 8];

/// Built-in generator: a seeded random walk over the tones of the current chord
///
/// One chord of the progression per 4/4 bar. Temperature widens leaps and
/// raises the rest rate.
pub struct ChordToneGenerator {
    rng: StdRng,
}

impl ChordToneGenerator {
    /// Create a generator; `None` seeds from entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ChordToneGenerator { rng }
    }

    fn candidates(chord: &ChordSymbol) -> Vec<u8> {
        let classes = chord.pitch_classes();
        (MELODY_LOW..=MELODY_HIGH)
            .filter(|pitch| classes.contains(&(pitch % 12)))
            .collect()
    }

    fn next_pitch(&mut self, candidates: &[u8], previous: u8, temperature: f64) -> u8 {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&pitch| {
                let leap = (pitch as f64 - previous as f64).abs();
                (-leap / (LEAP_SCALE * temperature)).exp()
            })
            .collect();

        match WeightedIndex::new(&weights) {
            Ok(distribution) => candidates[distribution.sample(&mut self.rng)],
            // Every weight underflowed: take the nearest tone
            Err(_) => candidates
                .iter()
                .copied()
                .min_by_key(|&pitch| (pitch as i16 - previous as i16).abs())
                .unwrap_or(previous),
        }
    }
}

impl MelodyGenerator for ChordToneGenerator {
    fn generate(&mut self, request: &MelodyRequest) -> Result<NoteSequence, MelodyError> {
        request.validate()?;

        let chords = request
            .chord_progression
            .iter()
            .map(|symbol| symbol.parse::<ChordSymbol>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MelodyError::InvalidRequest(e.to_string()))?;
        let chord_tones: Vec<Vec<u8>> = chords.iter().map(Self::candidates).collect();

        let steps_per_bar = STEPS_PER_QUARTER * 4;
        let rest_probability = (BASE_REST_PROBABILITY * request.temperature).clamp(0.05, 0.6);

        let mut sequence = NoteSequence::new(request.steps);
        let mut previous = request
            .primer
            .as_ref()
            .and_then(|primer| primer.notes.last())
            .map(|note| note.pitch)
            .unwrap_or(MELODY_START);

        let mut step = 0;
        while step < request.steps {
            let duration = DURATIONS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(1)
                .min(request.steps - step);

            if self.rng.gen_bool(rest_probability) {
                step += duration;
                continue;
            }

            let bar = (step / steps_per_bar) as usize;
            let candidates = &chord_tones[bar % chord_tones.len()];
            let pitch = self.next_pitch(candidates, previous, request.temperature);

            // Accent the beat
            let accent = if step % STEPS_PER_QUARTER == 0 { 12 } else { 0 };
            let velocity = self.rng.gen_range(70..=96) + accent;

            sequence.add_note(SequenceNote::new(
                pitch,
                velocity,
                step,
                step + duration,
                TrackRole::Melody,
            ));

            previous = pitch;
            step += duration;
        }

        log::debug!(
            "Chord-tone walk produced {} notes over {} steps",
            sequence.notes.len(),
            request.steps
        );

        Ok(sequence)
    }

    fn name(&self) -> &str {
        "chord_tones"
    }
}
