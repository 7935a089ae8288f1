// MIDI Export - Convert merged note sequences to MIDI files using midly crate
// One track per role (melody, chords, drums) plus a tempo/meta track

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use midly::{Smf, Header, Track, TrackEvent, TrackEventKind, MetaMessage, MidiMessage, Timing};
use thiserror::Error;

use super::sequence::{NoteSequence, SequenceNote, TrackRole};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write MIDI: {0}")]
    Encode(String),

    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(u32),

    #[error("Invalid grid resolution: {0} steps per quarter")]
    InvalidResolution(u32),

    #[error("Sequence of {0} steps is too long for MIDI delta times")]
    TooLong(u32),

    #[error("Failed to write MIDI file: {0}")]
    Io(#[from] std::io::Error),
}

/// Largest tick offset a MIDI variable-length delta can hold (28 bits)
pub const MAX_MIDI_TICKS: u64 = 0x0FFF_FFFF;

/// Largest value of the 24-bit tempo field (microseconds per quarter)
const MAX_TEMPO_FIELD: u32 = 0x00FF_FFFF;

/// Microseconds per quarter note for a tempo
///
/// Fails when the tempo does not fit the 24-bit field exactly (below 4 BPM
/// or above 60,000,000 BPM).
pub fn tempo_micros(bpm: u32) -> Result<u32, ExportError> {
    match 60_000_000u32.checked_div(bpm) {
        Some(us) if us > 0 && us <= MAX_TEMPO_FIELD => Ok(us),
        _ => Err(ExportError::InvalidTempo(bpm)),
    }
}

/// Ticks spanned by `steps` at the given resolution
pub fn ticks_for_steps(steps: u32, ppq: u16, steps_per_quarter: u32) -> u64 {
    steps as u64 * ppq as u64 / steps_per_quarter.max(1) as u64
}

/// MIDI export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
        }
    }
}

/// Export a note sequence to MIDI file bytes
///
/// Produces a format-1 file: track 0 carries tempo and time signature, then
/// one track per role present in the sequence. Chord labels are written as
/// text events on the chord track.
pub fn export_midi(sequence: &NoteSequence, options: &MidiExportOptions) -> Result<Vec<u8>, ExportError> {
    let bpm = sequence.tempo_or_default();
    let us_per_quarter = tempo_micros(bpm)?;
    if sequence.steps_per_quarter == 0 {
        return Err(ExportError::InvalidResolution(sequence.steps_per_quarter));
    }
    let last_step = sequence
        .notes
        .iter()
        .map(|n| n.end_step)
        .chain(sequence.chords.iter().map(|c| c.step))
        .fold(sequence.total_steps, u32::max);
    if ticks_for_steps(last_step, options.ppq, sequence.steps_per_quarter) > MAX_MIDI_TICKS {
        return Err(ExportError::TooLong(last_step));
    }

    let header = Header {
        format: midly::Format::Parallel,
        timing: Timing::Metrical(options.ppq.into()),
    };
    let clock = StepClock::new(options.ppq, sequence.steps_per_quarter);

    let mut tracks = Vec::new();

    // Track 0: Tempo and time signature metadata
    let mut meta_track = Track::new();
    if options.track_names {
        add_track_name(&mut meta_track, 0, "META");
    }
    if options.include_tempo {
        add_tempo(&mut meta_track, 0, us_per_quarter);
    }
    if options.include_time_signature {
        add_time_signature(&mut meta_track, 0);
    }
    add_end_of_track(&mut meta_track, 0);
    tracks.push(meta_track);

    for role in TrackRole::ALL {
        let notes: Vec<&SequenceNote> = sequence.notes_for(role).collect();
        if notes.is_empty() {
            continue;
        }
        let labels = if role == TrackRole::Chords {
            sequence.chords.as_slice()
        } else {
            &[]
        };
        tracks.push(create_role_track(role, &notes, labels, &clock, sequence.total_steps, options));
    }

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    Ok(bytes)
}

/// Export a note sequence and write it to `path`
pub fn write_midi_file(
    sequence: &NoteSequence,
    path: &Path,
    options: &MidiExportOptions,
) -> Result<(), ExportError> {
    let bytes = export_midi(sequence, options)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Converts grid steps to MIDI ticks
struct StepClock {
    ppq: u64,
    steps_per_quarter: u64,
}

impl StepClock {
    fn new(ppq: u16, steps_per_quarter: u32) -> Self {
        StepClock {
            ppq: ppq as u64,
            steps_per_quarter: steps_per_quarter as u64,
        }
    }

    /// Callers check the sequence length against `MAX_MIDI_TICKS` first
    fn ticks(&self, step: u32) -> u32 {
        (step as u64 * self.ppq / self.steps_per_quarter).min(MAX_MIDI_TICKS) as u32
    }
}

/// Order of events that share a tick: releases first, then labels, then attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventOrder {
    NoteOff,
    Meta,
    NoteOn,
}

/// Create a MIDI track for one role
fn create_role_track<'a>(
    role: TrackRole,
    notes: &[&SequenceNote],
    labels: &'a [super::sequence::ChordAnnotation],
    clock: &StepClock,
    total_steps: u32,
    options: &MidiExportOptions,
) -> Track<'a> {
    let channel = role.midi_channel();
    let mut track = Track::new();

    if options.track_names {
        add_track_name(&mut track, 0, track_name(role));
    }

    // Percussion ignores program changes
    if role != TrackRole::Drums {
        let program = notes.first().map(|n| n.program).unwrap_or(0);
        track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::ProgramChange { program: program.into() },
            },
        });
    }

    let mut events: Vec<(u32, EventOrder, TrackEventKind<'a>)> = Vec::new();

    for label in labels {
        events.push((
            clock.ticks(label.step),
            EventOrder::Meta,
            TrackEventKind::Meta(MetaMessage::Text(label.symbol.as_bytes())),
        ));
    }

    for note in notes {
        events.push((
            clock.ticks(note.start_step),
            EventOrder::NoteOn,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: note.pitch.into(),
                    vel: note.velocity.into(),
                },
            },
        ));

        events.push((
            clock.ticks(note.end_step),
            EventOrder::NoteOff,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff {
                    key: note.pitch.into(),
                    vel: 0.into(),
                },
            },
        ));
    }

    // Sort events by tick (absolute time)
    events.sort_by_key(|(tick, order, _)| (*tick, *order));

    // Convert to delta times and add to track
    let mut last_tick = 0;
    for (tick, _, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: delta.into(),
            kind,
        });
        last_tick = tick;
    }

    let end_tick = clock.ticks(total_steps).max(last_tick);
    add_end_of_track(&mut track, end_tick - last_tick);

    track
}

fn track_name(role: TrackRole) -> &'static str {
    match role {
        TrackRole::Melody => "MELODY",
        TrackRole::Chords => "CHORDS",
        TrackRole::Drums => "DRUMS",
    }
}

/// Add track name to track
fn add_track_name<'a>(track: &mut Track<'a>, delta: u32, name: &'a str) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
}

/// Add tempo meta message
fn add_tempo(track: &mut Track<'_>, delta: u32, us_per_quarter: u32) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    });
}

/// Add a 4/4 time signature meta message
fn add_time_signature(track: &mut Track<'_>, delta: u32) {
    let numerator = 4u8;
    let denominator = 2u8; // 2^2 = 4 (quarter note)

    // MIDI clocks per metronome click (24 for quarter note)
    let clocks_per_click = 24u8;

    // 32nd notes per quarter note (8)
    let thirty_seconds_per_quarter = 8u8;

    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
            numerator,
            denominator,
            clocks_per_click,
            thirty_seconds_per_quarter,
        )),
    });
}

/// Add end of track message
fn add_end_of_track(track: &mut Track<'_>, delta: u32) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
}
