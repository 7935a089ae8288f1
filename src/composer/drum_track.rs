// Drum Track - Lays a one-bar drum pattern onto the step grid
// Pattern values are GM percussion notes; 0 is a rest

use serde::{Deserialize, Serialize};

use crate::genres::DRUM_REST;
use super::sequence::{NoteSequence, SequenceNote, TrackRole, STEPS_PER_QUARTER};

/// Velocity for kick hits
const KICK_VELOCITY: u8 = 110;

/// Velocity for every other percussion hit
const DRUM_VELOCITY: u8 = 90;

/// A repeating drum pattern anchored on the step grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumTrack {
    /// One bar of percussion notes (0 = rest)
    pub pattern: Vec<u8>,

    /// Step the pattern starts on
    pub start_step: u32,

    pub steps_per_quarter: u32,

    /// Bar length handed to generators, derived as total steps / 4
    pub steps_per_bar: u32,
}

impl DrumTrack {
    /// Anchor a pattern at step 0 for a composition of `total_steps`
    pub fn new(pattern: Vec<u8>, total_steps: u32) -> Self {
        DrumTrack {
            pattern,
            start_step: 0,
            steps_per_quarter: STEPS_PER_QUARTER,
            steps_per_bar: total_steps / 4,
        }
    }

    /// Render the pattern, repeated, up to `total_steps`
    pub fn to_sequence(&self, total_steps: u32) -> NoteSequence {
        let mut sequence = NoteSequence::new(total_steps);
        if self.pattern.is_empty() {
            return sequence;
        }

        for step in self.start_step..total_steps {
            let index = ((step - self.start_step) as usize) % self.pattern.len();
            let pitch = self.pattern[index];
            if pitch == DRUM_REST {
                continue;
            }

            let velocity = if pitch == crate::genres::types::GM_KICK {
                KICK_VELOCITY
            } else {
                DRUM_VELOCITY
            };
            sequence.add_note(SequenceNote::new(pitch, velocity, step, step + 1, TrackRole::Drums));
        }

        sequence
    }

    /// Number of hits in one pass of the pattern
    pub fn hits_per_pattern(&self) -> usize {
        self.pattern.iter().filter(|&&p| p != DRUM_REST).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_bar_length() {
        let track = DrumTrack::new(vec![36, 0, 42, 0], 256);
        assert_eq!(track.start_step, 0);
        assert_eq!(track.steps_per_quarter, 4);
        assert_eq!(track.steps_per_bar, 64);
    }

    #[test]
    fn test_to_sequence_repeats_pattern() {
        let track = DrumTrack::new(vec![36, 0, 42, 0, 36, 0, 42, 0], 16);
        let sequence = track.to_sequence(16);

        // 4 hits per 8-step pattern, two passes
        assert_eq!(sequence.notes.len(), 8);
        assert_eq!(sequence.total_steps, 16);

        let steps: Vec<u32> = sequence.notes.iter().map(|n| n.start_step).collect();
        assert_eq!(steps, vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert!(sequence.notes.iter().all(|n| n.is_drum()));
    }

    #[test]
    fn test_kick_is_accented() {
        let track = DrumTrack::new(vec![36, 42], 2);
        let sequence = track.to_sequence(2);

        assert_eq!(sequence.notes[0].pitch, 36);
        assert!(sequence.notes[0].velocity > sequence.notes[1].velocity);
    }

    #[test]
    fn test_partial_final_pass() {
        let track = DrumTrack::new(vec![36, 42, 0, 36, 0, 42, 36, 0], 10);
        let sequence = track.to_sequence(10);

        // Full pass (5 hits) plus steps 8 and 9 (36, 42)
        assert_eq!(sequence.notes.len(), 7);
        assert_eq!(sequence.notes[6].start_step, 9);
        assert_eq!(sequence.notes[6].pitch, 42);
    }

    #[test]
    fn test_hits_per_pattern() {
        let track = DrumTrack::new(vec![36, 42, 0, 36, 0, 42, 36, 0], 16);
        assert_eq!(track.hits_per_pattern(), 5);
        assert_eq!(track.to_sequence(8).notes.len(), track.hits_per_pattern());
    }

    #[test]
    fn test_empty_pattern() {
        let track = DrumTrack::new(Vec::new(), 16);
        assert!(track.to_sequence(16).is_empty());
        assert_eq!(track.hits_per_pattern(), 0);
    }
}
