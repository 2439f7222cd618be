//! Speech synthesis and playback boundary.
//!
//! Synthesis, transcoding and playback are external engines behind traits;
//! the provided implementations shell out to configurable commands. The
//! [`cache::SpeechCache`] sits in front of synthesis so a sentence is
//! never synthesized twice.

pub mod cache;

pub use cache::SpeechCache;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Black box: text + language tag in, raw audio asset written to `output`.
pub trait SpeechSynthesizer: Send {
    fn synthesize(&self, text: &str, lang: &str, output: &Path) -> Result<()>;
}

/// Black box: converts a raw synthesis asset into the playback format.
pub trait AudioTranscoder: Send {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Black box: plays a playback-ready asset, returning once playback is done.
pub trait AudioPlayer: Send {
    fn play(&self, asset: &Path) -> Result<()>;
}

fn run_checked(mut command: Command) -> Result<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    let output = command
        .output()
        .map_err(|e| anyhow!("failed to launch {}: {}", program, e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} failed: {}", program, stderr));
    }
    Ok(())
}

/// gtts-cli-compatible synthesizer: `<cmd> <text> -l <lang> -o <output>`.
pub struct CommandSynthesizer {
    program: PathBuf,
}

impl CommandSynthesizer {
    pub fn new(program: &str) -> Self {
        Self {
            program: PathBuf::from(program),
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn synthesize(&self, text: &str, lang: &str, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.arg(text).args(["-l", lang]).arg("-o").arg(output);
        run_checked(command)
    }
}

/// ffmpeg-compatible transcoder: `<cmd> -y -i <input> <output>`.
pub struct CommandTranscoder {
    program: PathBuf,
}

impl CommandTranscoder {
    pub fn new(program: &str) -> Self {
        Self {
            program: PathBuf::from(program),
        }
    }
}

impl AudioTranscoder for CommandTranscoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.arg("-y").arg("-i").arg(input).arg(output);
        run_checked(command)
    }
}

/// Blocking player: `<cmd> <asset>`; process exit is the "played" signal.
///
/// Pointing the configured player at a loopback/virtual-cable output device
/// is what routes the audio into the device's recording path.
pub struct CommandPlayer {
    program: PathBuf,
}

impl CommandPlayer {
    pub fn new(program: &str) -> Self {
        Self {
            program: PathBuf::from(program),
        }
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, asset: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.arg(asset);
        run_checked(command)
    }
}
