// Chord Timeline - Cycle a chord progression across the step grid
// and voice the resulting timeline as a chord track

use thiserror::Error;

use crate::genres::chords::{ChordError, ChordSymbol};
use super::sequence::{NoteSequence, SequenceNote, TrackRole};

/// Base note chords are voiced from (C3)
pub const CHORD_BASE_NOTE: u8 = 48;

/// Velocity for chord tones
pub const CHORD_VELOCITY: u8 = 72;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Chord progression is empty")]
    EmptyProgression,

    #[error("Invalid chord in timeline: {0}")]
    InvalidChord(#[from] ChordError),
}

/// Build a per-step chord timeline
///
/// Element `i` is `progression[i % progression.len()]`; the result always has
/// exactly `total_steps` elements.
pub fn build_chord_timeline(
    progression: &[String],
    total_steps: u32,
) -> Result<Vec<String>, TimelineError> {
    if progression.is_empty() {
        return Err(TimelineError::EmptyProgression);
    }

    Ok((0..total_steps as usize)
        .map(|i| progression[i % progression.len()].clone())
        .collect())
}

/// Voice a chord timeline as a chord track
///
/// Runs of identical consecutive labels become one held chord.
pub fn render_chord_track(timeline: &[String], program: u8) -> Result<NoteSequence, TimelineError> {
    let mut sequence = NoteSequence::new(timeline.len() as u32);

    let mut step = 0usize;
    while step < timeline.len() {
        let symbol = &timeline[step];
        let run_end = timeline[step..]
            .iter()
            .position(|s| s != symbol)
            .map(|offset| step + offset)
            .unwrap_or(timeline.len());

        let chord: ChordSymbol = symbol.parse()?;
        sequence.add_chord(step as u32, symbol.clone());
        for pitch in chord.voice(CHORD_BASE_NOTE) {
            let mut note = SequenceNote::new(
                pitch,
                CHORD_VELOCITY,
                step as u32,
                run_end as u32,
                TrackRole::Chords,
            );
            note.program = program;
            sequence.add_note(note);
        }

        step = run_end;
    }

    Ok(sequence)
}
