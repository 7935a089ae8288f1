// CLI Commands
// Argument parsing, console prompts and the generate/list entry points

use clap::Parser;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::composer::{CompositionAssembler, MelodyBackend, MergeMode};
use crate::config::{self, FileNaming, GeneratorConfig};
use crate::genres;
use crate::preferences;

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Parser, Debug, Default)]
#[command(name = "cadenza", version, about)]
/// Generates multi-track MIDI compositions from genre chord progressions and drum patterns.
pub struct Cli {
    /// Genre to compose in (classical, jazz, rock, electronica).
    #[arg(short, long)]
    pub genre: Option<String>,

    /// Tempo in BPM. Zero or negative picks a random tempo in the genre's range.
    #[arg(short, long, allow_negative_numbers = true)]
    pub tempo: Option<i64>,

    /// Number of compositions to generate.
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Length of each composition in sixteenth-note steps.
    #[arg(long)]
    pub steps: Option<u32>,

    /// Melody sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Directory the MIDI files are written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file naming scheme.
    #[arg(long, value_enum)]
    pub naming: Option<FileNaming>,

    /// Melody generator backend.
    #[arg(long, value_enum)]
    pub backend: Option<MelodyBackend>,

    /// How melody, chord and drum tracks are combined.
    #[arg(long = "merge", value_enum)]
    pub merge_mode: Option<MergeMode>,

    /// Path to a JSON config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the available genres and exit.
    #[arg(long)]
    pub list_genres: bool,

    /// Never prompt for genre or tempo.
    #[arg(long)]
    pub no_prompt: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Console prompts run only when no preference was passed as a flag
    pub fn wants_prompt(&self) -> bool {
        !self.no_prompt && !self.list_genres && self.genre.is_none() && self.tempo.is_none()
    }

    /// Apply flag values on top of a loaded config
    pub fn apply_overrides(&self, config: &mut GeneratorConfig) {
        if let Some(count) = self.count {
            config.num_compositions = count;
        }
        if let Some(steps) = self.steps {
            config.steps_per_composition = steps;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(naming) = self.naming {
            config.naming = naming;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(mode) = self.merge_mode {
            config.merge_mode = mode;
        }
    }
}

/// Load the config file, apply flags and validate
pub fn resolve_config(cli: &Cli) -> CommandResult<GeneratorConfig> {
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Print every registered genre with its tempo range
pub fn list_genres_command<W: Write>(writer: &mut W) -> CommandResult<()> {
    for genre in genres::list_genres() {
        writeln!(
            writer,
            "{:<12} {:>3}-{:<3} BPM  {}",
            genre.name, genre.bpm_range.0, genre.bpm_range.1, genre.description
        )?;
    }
    Ok(())
}

/// Ask for genre and tempo on the console
///
/// Blank answers mean "random". A tempo that is not an integer is logged and
/// treated as blank.
pub fn prompt_preferences<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> CommandResult<(Option<String>, Option<i64>)> {
    writeln!(writer, "Available genres: {}", genres::list_genre_names().join(", "))?;

    write!(writer, "Enter genre (or press Enter for random): ")?;
    writer.flush()?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let genre = preferences::genre_from_input(&line);

    write!(writer, "Enter tempo (or press Enter for random): ")?;
    writer.flush()?;
    line.clear();
    reader.read_line(&mut line)?;
    let tempo = preferences::tempo_from_input(&line);

    Ok((genre, tempo))
}

/// Run a generation batch and report the written files
pub fn generate_command<R: BufRead, W: Write>(
    cli: &Cli,
    reader: &mut R,
    writer: &mut W,
) -> CommandResult<Vec<PathBuf>> {
    let config = resolve_config(cli)?;

    let (genre, tempo) = if cli.wants_prompt() {
        writeln!(writer, "Cadenza")?;
        writeln!(writer)?;
        prompt_preferences(reader, writer)?
    } else {
        (cli.genre.clone(), cli.tempo)
    };

    let mut assembler = CompositionAssembler::from_config(config)?;
    let paths = assembler.generate_music(genre.as_deref(), tempo)?;

    writeln!(writer)?;
    writeln!(writer, "Generation complete!")?;
    for path in &paths {
        writeln!(writer, "  {}", path.display())?;
    }

    Ok(paths)
}

/// Dispatch a parsed command line against the process console
pub fn execute(cli: &Cli) -> CommandResult<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    if cli.list_genres {
        return list_genres_command(&mut writer);
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    generate_command(cli, &mut reader, &mut writer)?;
    Ok(())
}
