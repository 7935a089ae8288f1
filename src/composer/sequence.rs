// Note Sequence - Step-grid musical sequence shared by melody, chord and drum tracks
// The common currency between generators, the merger and MIDI export

use serde::{Deserialize, Serialize};

/// Grid resolution: steps per quarter note (sixteenth-note steps)
pub const STEPS_PER_QUARTER: u32 = 4;

/// Tempo used for export when a sequence carries none
pub const DEFAULT_TEMPO_BPM: u32 = 120;

/// Which part of the arrangement a note belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Melody,
    Chords,
    Drums,
}

impl TrackRole {
    /// All roles in output track order
    pub const ALL: [TrackRole; 3] = [TrackRole::Melody, TrackRole::Chords, TrackRole::Drums];

    /// Convert to string representation
    pub fn to_string(&self) -> &'static str {
        match self {
            TrackRole::Melody => "melody",
            TrackRole::Chords => "chords",
            TrackRole::Drums => "drums",
        }
    }

    /// MIDI channel (0-indexed) used for this role
    pub fn midi_channel(&self) -> u8 {
        match self {
            TrackRole::Melody => 0,
            TrackRole::Chords => 1,
            TrackRole::Drums => 9, // Channel 10 is drums in General MIDI
        }
    }
}

/// A single note on the step grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceNote {
    /// MIDI pitch (0-127); percussion key for drum notes
    pub pitch: u8,

    /// MIDI velocity (1-127)
    pub velocity: u8,

    /// First step the note sounds on
    pub start_step: u32,

    /// Step the note is released on (exclusive)
    pub end_step: u32,

    #[serde(default = "default_role")]
    pub role: TrackRole,

    /// GM program number (ignored for drums)
    #[serde(default)]
    pub program: u8,
}

fn default_role() -> TrackRole {
    TrackRole::Melody
}

impl SequenceNote {
    /// Create a new note; velocity is clamped to the audible MIDI range
    pub fn new(pitch: u8, velocity: u8, start_step: u32, end_step: u32, role: TrackRole) -> Self {
        SequenceNote {
            pitch: pitch.min(127),
            velocity: velocity.clamp(1, 127),
            start_step,
            end_step: end_step.max(start_step + 1),
            role,
            program: 0,
        }
    }

    /// Length in steps
    pub fn duration_steps(&self) -> u32 {
        self.end_step.saturating_sub(self.start_step)
    }

    pub fn is_drum(&self) -> bool {
        self.role == TrackRole::Drums
    }
}

/// A chord label placed on the step grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordAnnotation {
    pub step: u32,
    pub symbol: String,
}

/// A complete step-grid sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSequence {
    pub notes: Vec<SequenceNote>,

    #[serde(default)]
    pub chords: Vec<ChordAnnotation>,

    /// Tempo in beats per minute, if set
    #[serde(default)]
    pub tempo_bpm: Option<u32>,

    #[serde(default = "default_steps_per_quarter")]
    pub steps_per_quarter: u32,

    /// Length of the sequence in steps
    pub total_steps: u32,
}

fn default_steps_per_quarter() -> u32 {
    STEPS_PER_QUARTER
}

impl NoteSequence {
    /// Create an empty sequence of the given length
    pub fn new(total_steps: u32) -> Self {
        NoteSequence {
            notes: Vec::new(),
            chords: Vec::new(),
            tempo_bpm: None,
            steps_per_quarter: STEPS_PER_QUARTER,
            total_steps,
        }
    }

    /// Add a note, growing the sequence if the note ends past it
    pub fn add_note(&mut self, note: SequenceNote) {
        self.total_steps = self.total_steps.max(note.end_step);
        self.notes.push(note);
    }

    /// Add a chord label
    pub fn add_chord(&mut self, step: u32, symbol: impl Into<String>) {
        self.chords.push(ChordAnnotation {
            step,
            symbol: symbol.into(),
        });
    }

    /// Override the tempo
    pub fn set_tempo(&mut self, bpm: u32) {
        self.tempo_bpm = Some(bpm);
    }

    /// Tempo for playback, falling back to the default
    pub fn tempo_or_default(&self) -> u32 {
        self.tempo_bpm.unwrap_or(DEFAULT_TEMPO_BPM)
    }

    /// Set the GM program on every note of a role
    pub fn set_program(&mut self, role: TrackRole, program: u8) {
        for note in self.notes.iter_mut().filter(|n| n.role == role) {
            note.program = program.min(127);
        }
    }

    /// Reassign every note to a role
    pub fn assign_role(&mut self, role: TrackRole) {
        for note in &mut self.notes {
            note.role = role;
        }
    }

    /// Notes belonging to one role
    pub fn notes_for(&self, role: TrackRole) -> impl Iterator<Item = &SequenceNote> {
        self.notes.iter().filter(move |n| n.role == role)
    }

    /// Copy of this sequence moved later by `offset` steps
    pub fn shifted(&self, offset: u32) -> NoteSequence {
        let mut shifted = self.clone();
        for note in &mut shifted.notes {
            note.start_step += offset;
            note.end_step += offset;
        }
        for chord in &mut shifted.chords {
            chord.step += offset;
        }
        shifted.total_steps += offset;
        shifted
    }

    /// Sort notes and chords by time
    pub fn sort_by_time(&mut self) {
        self.notes
            .sort_by_key(|n| (n.start_step, n.role, n.pitch));
        self.chords.sort_by_key(|c| c.step);
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_clamps() {
        let note = SequenceNote::new(60, 0, 4, 4, TrackRole::Melody);
        assert_eq!(note.velocity, 1);
        assert_eq!(note.end_step, 5); // At least one step long
        assert_eq!(note.duration_steps(), 1);
    }

    #[test]
    fn test_add_note_grows_sequence() {
        let mut sequence = NoteSequence::new(8);
        sequence.add_note(SequenceNote::new(60, 90, 6, 12, TrackRole::Melody));
        assert_eq!(sequence.total_steps, 12);
    }

    #[test]
    fn test_shifted() {
        let mut sequence = NoteSequence::new(16);
        sequence.add_note(SequenceNote::new(60, 90, 0, 2, TrackRole::Melody));
        sequence.add_chord(0, "C");

        let shifted = sequence.shifted(16);
        assert_eq!(shifted.notes[0].start_step, 16);
        assert_eq!(shifted.notes[0].end_step, 18);
        assert_eq!(shifted.chords[0].step, 16);
        assert_eq!(shifted.total_steps, 32);
    }

    #[test]
    fn test_set_program_only_touches_role() {
        let mut sequence = NoteSequence::new(4);
        sequence.add_note(SequenceNote::new(60, 90, 0, 1, TrackRole::Melody));
        sequence.add_note(SequenceNote::new(36, 90, 0, 1, TrackRole::Drums));

        sequence.set_program(TrackRole::Melody, 65);

        assert_eq!(sequence.notes[0].program, 65);
        assert_eq!(sequence.notes[1].program, 0);
    }

    #[test]
    fn test_tempo_default() {
        let mut sequence = NoteSequence::new(4);
        assert_eq!(sequence.tempo_or_default(), DEFAULT_TEMPO_BPM);
        sequence.set_tempo(96);
        assert_eq!(sequence.tempo_or_default(), 96);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"notes":[{"pitch":64,"velocity":80,"start_step":0,"end_step":2}],"total_steps":16}"#;
        let sequence: NoteSequence = serde_json::from_str(json).unwrap();

        assert_eq!(sequence.notes.len(), 1);
        assert_eq!(sequence.notes[0].role, TrackRole::Melody);
        assert_eq!(sequence.steps_per_quarter, STEPS_PER_QUARTER);
        assert_eq!(sequence.tempo_bpm, None);
    }
}
