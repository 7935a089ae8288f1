// External Model Backend - Runs a model wrapper process per melody request
// Protocol: request JSON on stdin, NoteSequence JSON on stdout, non-zero exit = failure

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

use super::melody::{MelodyError, MelodyGenerator, MelodyRequest};
use super::sequence::{NoteSequence, TrackRole};

/// Command line used to launch the model wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCommand {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Melody generator backed by an external model process
pub struct ExternalProcessGenerator {
    command: ExternalCommand,
}

impl ExternalProcessGenerator {
    pub fn new(command: ExternalCommand) -> Self {
        ExternalProcessGenerator { command }
    }

    fn run(&self, input: &[u8]) -> Result<Vec<u8>, MelodyError> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(MelodyError::ProcessFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl MelodyGenerator for ExternalProcessGenerator {
    fn generate(&mut self, request: &MelodyRequest) -> Result<NoteSequence, MelodyError> {
        let input = serde_json::to_vec(request)?;

        log::debug!(
            "Requesting {} steps from '{}' (model {})",
            request.steps,
            self.command.program,
            request.model_name
        );

        let stdout = self.run(&input)?;
        let mut melody: NoteSequence = serde_json::from_slice(&stdout)?;

        if let Some(note) = melody.notes.iter().find(|n| n.pitch > 127 || n.velocity > 127) {
            return Err(MelodyError::GenerationFailed(format!(
                "note out of MIDI range: pitch {}, velocity {}",
                note.pitch, note.velocity
            )));
        }

        melody.assign_role(TrackRole::Melody);
        melody.total_steps = melody.total_steps.max(request.steps);
        Ok(melody)
    }

    fn name(&self) -> &str {
        "external"
    }
}
