// Composer Module
// Chord timelines, drum tracks, melody generation, merging and MIDI export

pub mod assembler;
pub mod drum_track;
pub mod external;
pub mod melody;
pub mod merge;
pub mod midi;
pub mod sequence;
pub mod timeline;

// Re-export main types
pub use assembler::{generator_for, ComposeError, Composition, CompositionAssembler};
pub use drum_track::DrumTrack;
pub use external::{ExternalCommand, ExternalProcessGenerator};
pub use melody::{ChordToneGenerator, MelodyBackend, MelodyError, MelodyGenerator, MelodyRequest};
pub use merge::{merger_for, AppendMerger, MergeMode, OverlayMerger, SequenceMerger};
pub use midi::{export_midi, tempo_micros, write_midi_file, ExportError, MidiExportOptions};
pub use sequence::{ChordAnnotation, NoteSequence, SequenceNote, TrackRole, STEPS_PER_QUARTER};
pub use timeline::{build_chord_timeline, render_chord_track, TimelineError};
