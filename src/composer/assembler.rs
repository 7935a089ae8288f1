// Composition Assembler - Runs a batch: select patterns, generate melody, merge, write MIDI
// One composition at a time; the first failure stops the batch

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{ConfigError, GeneratorConfig};
use crate::genres::{self, GenreProfile};
use crate::pipeline::{GenerationTrace, TraceEntry, TraceStage, TraceStatus};
use crate::preferences::{self, ResolvedPreferences};
use crate::state::{self, CompositionRecord, RunManifest, StorageError};
use super::drum_track::DrumTrack;
use super::external::ExternalProcessGenerator;
use super::melody::{ChordToneGenerator, MelodyBackend, MelodyError, MelodyGenerator, MelodyRequest};
use super::merge::{merger_for, SequenceMerger};
use super::midi::{export_midi, ExportError};
use super::sequence::{NoteSequence, TrackRole};
use super::timeline::{build_chord_timeline, render_chord_track, TimelineError};

/// Mixed into the seed so the melody walk and pattern selection draw different streams
const GENERATOR_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Steps per composition must be at least 1")]
    InvalidSteps,

    #[error("Chord timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("External generation failed for composition {number}: {source}")]
    Generation {
        number: u32,
        #[source]
        source: MelodyError,
    },

    #[error("MIDI export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One rendered composition, alive until its file is written
#[derive(Debug, Clone)]
pub struct Composition {
    /// Zero-based position in the batch
    pub index: u32,
    pub genre: String,
    pub tempo: u32,
    pub chord_progression: Vec<String>,
    pub drum_pattern: Vec<u8>,
    pub melody_notes: usize,
    pub sequence: NoteSequence,
}

/// Create the melody generator selected by the config
pub fn generator_for(config: &GeneratorConfig) -> Result<Box<dyn MelodyGenerator>, ConfigError> {
    match config.backend {
        MelodyBackend::ChordTones => Ok(Box::new(ChordToneGenerator::new(
            config.seed.map(|seed| seed ^ GENERATOR_SEED_SALT),
        ))),
        MelodyBackend::External => {
            let command = config.external_command.clone().ok_or_else(|| {
                ConfigError::Invalid("backend 'external' needs external_command".to_string())
            })?;
            Ok(Box::new(ExternalProcessGenerator::new(command)))
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Batch driver owning the generator, merger and shared randomness
pub struct CompositionAssembler {
    config: GeneratorConfig,
    generator: Box<dyn MelodyGenerator>,
    merger: Box<dyn SequenceMerger>,
    rng: StdRng,
    last_manifest: Option<RunManifest>,
}

impl CompositionAssembler {
    pub fn new(
        config: GeneratorConfig,
        generator: Box<dyn MelodyGenerator>,
        merger: Box<dyn SequenceMerger>,
        rng: StdRng,
    ) -> Self {
        CompositionAssembler {
            config,
            generator,
            merger,
            rng,
            last_manifest: None,
        }
    }

    /// Build an assembler with the backend, merger and seed named by the config
    pub fn from_config(config: GeneratorConfig) -> Result<Self, ComposeError> {
        config.validate()?;
        let generator = generator_for(&config)?;
        let merger = merger_for(config.merge_mode);
        let rng = seeded_rng(config.seed);
        Ok(Self::new(config, generator, merger, rng))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Manifest of the last successful batch
    pub fn last_manifest(&self) -> Option<&RunManifest> {
        self.last_manifest.as_ref()
    }

    /// Resolve genre/tempo preferences with the shared randomness source
    pub fn resolve(&mut self, genre: Option<&str>, tempo: Option<i64>) -> ResolvedPreferences {
        preferences::resolve_preferences(genre, tempo, &mut self.rng)
    }

    /// Resolve preferences, then generate a configured batch
    pub fn generate_music(
        &mut self,
        preferred_genre: Option<&str>,
        preferred_tempo: Option<i64>,
    ) -> Result<Vec<PathBuf>, ComposeError> {
        let resolved = self.resolve(preferred_genre, preferred_tempo);
        log::info!("Genre: {}, tempo: {} BPM", resolved.genre, resolved.tempo);

        let steps = self.config.steps_per_composition;
        let count = self.config.num_compositions;
        self.generate(&resolved.genre, resolved.tempo, steps, count)
    }

    /// Generate `num_compositions` files for a resolved genre and tempo
    ///
    /// Returns written paths in generation order. Stops at the first failing
    /// composition; files already written stay on disk.
    pub fn generate(
        &mut self,
        genre: &str,
        tempo: u32,
        steps: u32,
        num_compositions: u32,
    ) -> Result<Vec<PathBuf>, ComposeError> {
        if steps == 0 {
            return Err(ComposeError::InvalidSteps);
        }

        let output_dir = state::ensure_output_dir(&self.config.output_dir)?;
        let trace = if self.config.write_trace {
            GenerationTrace::start_in_dir(&output_dir).unwrap_or_else(|e| {
                log::warn!("Failed to start trace, tracing disabled: {}", e);
                GenerationTrace::disabled()
            })
        } else {
            GenerationTrace::disabled()
        };

        let profile = genres::genre_or_default(genre);
        let mut manifest = RunManifest::new(
            genre,
            tempo,
            steps,
            self.config.temperature,
            self.generator.name(),
        );

        trace.record(
            TraceEntry::new(TraceStage::Batch, TraceStatus::Started, 0.0, "Generating batch")
                .with_data(serde_json::json!({
                    "genre": genre,
                    "tempo": tempo,
                    "steps": steps,
                    "compositions": num_compositions,
                })),
        );

        for index in 0..num_compositions {
            let number = index + 1;
            let progress = index as f32 / num_compositions as f32;
            trace.record(
                TraceEntry::new(TraceStage::Composition, TraceStatus::Started, progress, "Composing")
                    .for_composition(number),
            );

            let record = match self.produce(index, genre, tempo, steps, &profile, &output_dir) {
                Ok(record) => record,
                Err(e) => {
                    log::error!("Composition {} failed: {}", number, e);
                    trace.record(
                        TraceEntry::new(TraceStage::Composition, TraceStatus::Failed, progress, "Composition failed")
                            .for_composition(number)
                            .with_data(serde_json::json!({ "error": e.to_string() })),
                    );
                    trace.record(TraceEntry::new(
                        TraceStage::Batch,
                        TraceStatus::Failed,
                        progress,
                        format!("Stopped after {} of {} compositions", index, num_compositions),
                    ));
                    return Err(e);
                }
            };

            log::info!(
                "MIDI sequence {} generated and saved as {}",
                number,
                record.path.display()
            );
            trace.record(
                TraceEntry::new(
                    TraceStage::Composition,
                    TraceStatus::Completed,
                    number as f32 / num_compositions as f32,
                    "Composition written",
                )
                .for_composition(number)
                .with_data(serde_json::json!({
                    "path": record.path,
                    "chord_progression": record.chord_progression,
                })),
            );
            manifest.record(record);
        }

        trace.record(TraceEntry::new(
            TraceStage::Batch,
            TraceStatus::Completed,
            1.0,
            format!("Generated {} compositions", num_compositions),
        ));

        if self.config.write_manifest {
            match manifest.write(&output_dir) {
                Ok(path) => log::debug!("Manifest written to {}", path.display()),
                Err(e) => log::warn!("Failed to write manifest: {}", e),
            }
        }

        let paths = manifest.paths();
        self.last_manifest = Some(manifest);
        Ok(paths)
    }

    /// Compose, serialize and store one composition
    fn produce(
        &mut self,
        index: u32,
        genre: &str,
        tempo: u32,
        steps: u32,
        profile: &GenreProfile,
        output_dir: &Path,
    ) -> Result<CompositionRecord, ComposeError> {
        let composition = self.compose(index, genre, tempo, steps, profile)?;

        let bytes = export_midi(&composition.sequence, &self.config.midi)?;
        let file_name = self.config.naming.file_name(genre, index);
        let (path, sha256) = state::store_file(output_dir, &file_name, &bytes)?;

        Ok(CompositionRecord {
            index: index + 1,
            path,
            sha256,
            bytes: bytes.len() as u64,
            chord_progression: composition.chord_progression,
            drum_pattern: composition.drum_pattern,
            melody_notes: composition.melody_notes,
        })
    }

    /// Build one merged composition in memory
    pub fn compose(
        &mut self,
        index: u32,
        genre: &str,
        tempo: u32,
        steps: u32,
        profile: &GenreProfile,
    ) -> Result<Composition, ComposeError> {
        let chord_progression = genres::select_chord_progression(genre, &mut self.rng);
        let drum_pattern = genres::select_drum_pattern(genre, &mut self.rng);

        let timeline = build_chord_timeline(&chord_progression, steps)?;
        let drum_track = DrumTrack::new(drum_pattern.clone(), steps);

        let request = MelodyRequest {
            model_name: self.config.model_name.clone(),
            temperature: self.config.temperature,
            steps,
            drum_track: drum_track.clone(),
            genre: genre.to_string(),
            tempo,
            chord_progression: chord_progression.clone(),
            primer: None,
        };

        let mut melody = self
            .generator
            .generate(&request)
            .map_err(|source| ComposeError::Generation {
                number: index + 1,
                source,
            })?;
        melody.assign_role(TrackRole::Melody);
        melody.set_program(TrackRole::Melody, profile.melody_program);
        let melody_notes = melody.notes.len();

        let chords = render_chord_track(&timeline, profile.chord_program)?;
        let drums = drum_track.to_sequence(steps);

        let mut sequence = self.merger.merge(&[melody, chords, drums]);
        sequence.set_tempo(tempo);

        log::debug!(
            "Composition {}: {} over {:?} ({} hits per pass), {} melody notes",
            index + 1,
            chord_progression.join("-"),
            drum_pattern,
            drum_track.hits_per_pattern(),
            melody_notes
        );

        Ok(Composition {
            index,
            genre: genre.to_string(),
            tempo,
            chord_progression,
            drum_pattern,
            melody_notes,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::merge::{AppendMerger, MergeMode, OverlayMerger};
    use crate::composer::sequence::SequenceNote;
    use crate::config::FileNaming;
    use crate::pipeline::{read_trace_file, TRACE_FILE_NAME};
    use crate::state::MANIFEST_FILE_NAME;
    use midly::{MetaMessage, Smf, TrackEventKind};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Returns one held note per request; optionally fails on the n-th call (1-based)
    struct StubGenerator {
        requests: Rc<RefCell<Vec<MelodyRequest>>>,
        fail_on: Option<usize>,
    }

    impl MelodyGenerator for StubGenerator {
        fn generate(&mut self, request: &MelodyRequest) -> Result<NoteSequence, MelodyError> {
            self.requests.borrow_mut().push(request.clone());
            if Some(self.requests.borrow().len()) == self.fail_on {
                return Err(MelodyError::GenerationFailed("model error".to_string()));
            }

            let mut melody = NoteSequence::new(request.steps);
            melody.add_note(SequenceNote::new(72, 100, 0, 4, TrackRole::Melody));
            Ok(melody)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn test_config(dir: &Path) -> GeneratorConfig {
        GeneratorConfig {
            output_dir: dir.join("generated_music"),
            seed: Some(1234),
            ..GeneratorConfig::default()
        }
    }

    fn stub_assembler(
        config: GeneratorConfig,
        fail_on: Option<usize>,
    ) -> (CompositionAssembler, Rc<RefCell<Vec<MelodyRequest>>>) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let generator = StubGenerator {
            requests: Rc::clone(&requests),
            fail_on,
        };
        let assembler = CompositionAssembler::new(
            config,
            Box::new(generator),
            Box::new(OverlayMerger),
            StdRng::seed_from_u64(99),
        );
        (assembler, requests)
    }

    fn midi_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".mid"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_jazz_batch_writes_three_files() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        let paths = assembler.generate("jazz", 120, 256, 3).unwrap();

        assert_eq!(
            paths,
            vec![
                output_dir.join("jazz_1.mid"),
                output_dir.join("jazz_2.mid"),
                output_dir.join("jazz_3.mid"),
            ]
        );
        assert_eq!(midi_files(&output_dir), vec!["jazz_1.mid", "jazz_2.mid", "jazz_3.mid"]);

        for path in &paths {
            let bytes = fs::read(path).unwrap();
            assert!(!bytes.is_empty());

            let smf = Smf::parse(&bytes).unwrap();
            assert_eq!(smf.tracks.len(), 4); // meta + melody + chords + drums

            let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
                _ => None,
            });
            assert_eq!(tempo, Some(500_000)); // 120 BPM
        }
    }

    #[test]
    fn test_failure_stops_batch_and_keeps_earlier_files() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, requests) = stub_assembler(config, Some(2));

        let result = assembler.generate("jazz", 120, 256, 3);

        match result {
            Err(ComposeError::Generation { number, .. }) => assert_eq!(number, 2),
            other => panic!("Expected generation failure, got {:?}", other),
        }
        assert_eq!(requests.borrow().len(), 2);
        assert!(output_dir.join("jazz_1.mid").exists());
        assert!(!output_dir.join("jazz_2.mid").exists());
        assert!(!output_dir.join("jazz_3.mid").exists());
        assert!(!output_dir.join(MANIFEST_FILE_NAME).exists());
        assert!(assembler.last_manifest().is_none());

        let trace = read_trace_file(&output_dir.join(TRACE_FILE_NAME)).unwrap();
        let last = trace.last().unwrap();
        assert_eq!(last.stage, TraceStage::Batch);
        assert_eq!(last.status, TraceStatus::Failed);
    }

    #[test]
    fn test_request_contents() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let (mut assembler, requests) = stub_assembler(config, None);

        assembler.generate("jazz", 132, 64, 2).unwrap();

        let jazz = genres::get_genre("jazz").unwrap();
        let requests = requests.borrow();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.model_name, "attention_rnn");
            assert!((request.temperature - 1.2).abs() < f64::EPSILON);
            assert_eq!(request.steps, 64);
            assert_eq!(request.genre, "jazz");
            assert_eq!(request.tempo, 132);
            assert!(request.primer.is_none());
            assert!(jazz.chord_progressions.contains(&request.chord_progression));
            assert!(jazz.drum_patterns.contains(&request.drum_track.pattern));
            assert_eq!(request.drum_track.steps_per_bar, 16);
        }
    }

    #[test]
    fn test_compose_merges_all_roles() {
        let temp = TempDir::new().unwrap();
        let (mut assembler, _) = stub_assembler(test_config(temp.path()), None);
        let profile = genres::get_genre("rock").unwrap();

        let composition = assembler.compose(0, "rock", 150, 32, &profile).unwrap();

        assert_eq!(composition.sequence.tempo_bpm, Some(150));
        assert_eq!(composition.sequence.total_steps, 32);
        for role in TrackRole::ALL {
            assert!(composition.sequence.notes_for(role).count() > 0);
        }
        assert!(composition
            .sequence
            .notes_for(TrackRole::Melody)
            .all(|n| n.program == profile.melody_program));
        assert!(!composition.sequence.chords.is_empty());
        assert!(composition.sequence.chords.iter().all(|c| c.step < 32));
        assert_eq!(composition.melody_notes, 1);
    }

    #[test]
    fn test_append_merger_lays_tracks_end_to_end() {
        let temp = TempDir::new().unwrap();
        let requests = Rc::new(RefCell::new(Vec::new()));
        let mut assembler = CompositionAssembler::new(
            test_config(temp.path()),
            Box::new(StubGenerator { requests, fail_on: None }),
            Box::new(AppendMerger),
            StdRng::seed_from_u64(5),
        );
        let profile = genres::get_genre("classical").unwrap();

        let composition = assembler.compose(0, "classical", 90, 16, &profile).unwrap();
        assert_eq!(composition.sequence.total_steps, 48);
    }

    #[test]
    fn test_plain_naming() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.naming = FileNaming::Plain;
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        assembler.generate("rock", 140, 32, 2).unwrap();
        assert_eq!(midi_files(&output_dir), vec!["0.mid", "1.mid"]);
    }

    #[test]
    fn test_unknown_genre_uses_rock_tables() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, requests) = stub_assembler(config, None);

        assembler.generate("polka", 100, 32, 1).unwrap();

        assert_eq!(midi_files(&output_dir), vec!["polka_1.mid"]);
        let rock = genres::get_genre("rock").unwrap();
        assert!(rock.chord_progressions.contains(&requests.borrow()[0].chord_progression));
    }

    #[test]
    fn test_manifest_matches_files() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        let paths = assembler.generate("electronica", 128, 64, 2).unwrap();

        let manifest = RunManifest::read(&output_dir.join(MANIFEST_FILE_NAME)).unwrap();
        assert_eq!(manifest.genre, "electronica");
        assert_eq!(manifest.tempo, 128);
        assert_eq!(manifest.backend, "stub");
        assert_eq!(manifest.paths(), paths);

        for record in &manifest.compositions {
            let bytes = fs::read(&record.path).unwrap();
            assert_eq!(record.bytes, bytes.len() as u64);
            assert_eq!(record.sha256, state::calculate_sha256(&bytes));
        }
    }

    #[test]
    fn test_trace_holds_only_latest_batch() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        assembler.generate("jazz", 120, 16, 2).unwrap();
        assembler.generate("rock", 140, 16, 1).unwrap();

        let trace = read_trace_file(&output_dir.join(TRACE_FILE_NAME)).unwrap();
        let batch_starts: Vec<&TraceEntry> = trace
            .iter()
            .filter(|e| e.stage == TraceStage::Batch && e.status == TraceStatus::Started)
            .collect();
        assert_eq!(batch_starts.len(), 1);
        assert_eq!(batch_starts[0].data.as_ref().unwrap()["genre"], "rock");
        // batch start, composition start + completed, batch completed
        assert_eq!(trace.len(), 4);
    }

    #[test]
    fn test_manifest_and_trace_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.write_manifest = false;
        config.write_trace = false;
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        assembler.generate("jazz", 120, 16, 1).unwrap();

        assert!(!output_dir.join(MANIFEST_FILE_NAME).exists());
        assert!(!output_dir.join(TRACE_FILE_NAME).exists());
        assert!(assembler.last_manifest().is_some());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let temp = TempDir::new().unwrap();
        let (mut assembler, _) = stub_assembler(test_config(temp.path()), None);
        assert!(matches!(
            assembler.generate("jazz", 120, 0, 3),
            Err(ComposeError::InvalidSteps)
        ));
    }

    #[test]
    fn test_zero_compositions_creates_dir_only() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let output_dir = config.output_dir.clone();
        let (mut assembler, _) = stub_assembler(config, None);

        let paths = assembler.generate("jazz", 120, 16, 0).unwrap();
        assert!(paths.is_empty());
        assert!(output_dir.is_dir());
        assert!(midi_files(&output_dir).is_empty());
    }

    #[test]
    fn test_generate_music_with_builtin_backend() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.steps_per_composition = 64;
        config.merge_mode = MergeMode::Overlay;
        let output_dir = config.output_dir.clone();

        let mut assembler = CompositionAssembler::from_config(config).unwrap();
        let paths = assembler.generate_music(Some("classical"), Some(90)).unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(
            midi_files(&output_dir),
            vec!["classical_1.mid", "classical_2.mid", "classical_3.mid"]
        );
        let manifest = assembler.last_manifest().unwrap();
        assert_eq!(manifest.tempo, 90);
        assert_eq!(manifest.backend, "chord_tones");
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = |dir: &Path| {
            let mut assembler = CompositionAssembler::from_config(test_config(dir)).unwrap();
            let resolved = assembler.resolve(None, None);
            let paths = assembler.generate(&resolved.genre, resolved.tempo, 32, 1).unwrap();
            (resolved, fs::read(&paths[0]).unwrap())
        };

        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        assert_eq!(run(first.path()), run(second.path()));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.backend = MelodyBackend::External;

        assert!(matches!(
            CompositionAssembler::from_config(config),
            Err(ComposeError::Config(_))
        ));
    }
}
