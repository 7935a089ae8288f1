// Sequence Merging - Combine melody, chord and drum sequences into one timeline

use serde::{Deserialize, Serialize};

use super::sequence::{NoteSequence, STEPS_PER_QUARTER};

/// How sequences are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Every sequence starts at step 0 (tracks play together)
    #[default]
    Overlay,

    /// Each sequence starts where the previous one ends
    Append,
}

/// Merges an ordered list of sequences into one
///
/// The output keeps input order within equal start steps; the tempo of the
/// result is the first sequence's tempo, if any.
pub trait SequenceMerger {
    fn merge(&self, sequences: &[NoteSequence]) -> NoteSequence;
}

/// Plays all sequences simultaneously from step 0
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayMerger;

impl SequenceMerger for OverlayMerger {
    fn merge(&self, sequences: &[NoteSequence]) -> NoteSequence {
        combine(sequences, |_| 0)
    }
}

/// Places each sequence after the end of the previous one
#[derive(Debug, Default, Clone, Copy)]
pub struct AppendMerger;

impl SequenceMerger for AppendMerger {
    fn merge(&self, sequences: &[NoteSequence]) -> NoteSequence {
        combine(sequences, |end_so_far| end_so_far)
    }
}

/// Get the merger for a mode
pub fn merger_for(mode: MergeMode) -> Box<dyn SequenceMerger> {
    match mode {
        MergeMode::Overlay => Box::new(OverlayMerger),
        MergeMode::Append => Box::new(AppendMerger),
    }
}

fn combine<F>(sequences: &[NoteSequence], offset_for: F) -> NoteSequence
where
    F: Fn(u32) -> u32,
{
    let mut merged = NoteSequence::new(0);
    merged.steps_per_quarter = sequences
        .first()
        .map(|s| s.steps_per_quarter)
        .unwrap_or(STEPS_PER_QUARTER);
    merged.tempo_bpm = sequences.iter().find_map(|s| s.tempo_bpm);

    let mut end_so_far = 0;
    for sequence in sequences {
        let offset = offset_for(end_so_far);
        let placed = if offset == 0 {
            sequence.clone()
        } else {
            sequence.shifted(offset)
        };

        end_so_far = end_so_far.max(placed.total_steps);
        merged.total_steps = merged.total_steps.max(placed.total_steps);
        merged.notes.extend(placed.notes);
        merged.chords.extend(placed.chords);
    }

    merged.sort_by_time();
    merged
}
