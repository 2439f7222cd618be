//! Content-addressed cache of synthesized audio.
//!
//! Keys are the hex SHA-256 of (language, text); one playback-ready `.wav`
//! per key under the cache directory. Entries are never evicted or
//! invalidated, so the directory grows with the set of distinct sentences
//! seen — acceptable for homework-sized vocabularies.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::logging::Logger;
use super::{AudioTranscoder, SpeechSynthesizer};

pub struct SpeechCache {
    dir: PathBuf,
    synthesizer: Box<dyn SpeechSynthesizer>,
    transcoder: Box<dyn AudioTranscoder>,
    logger: Logger,
}

impl SpeechCache {
    pub fn new(
        dir: &Path,
        synthesizer: Box<dyn SpeechSynthesizer>,
        transcoder: Box<dyn AudioTranscoder>,
        logger: Logger,
    ) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create speech cache dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            synthesizer,
            transcoder,
            logger,
        })
    }

    /// Returns the playback-ready asset for `(text, lang)`, synthesizing
    /// and transcoding only when the key is not present yet. The raw
    /// synthesis intermediate is removed after a successful transcode.
    pub fn synthesize(&self, text: &str, lang: &str) -> Result<PathBuf> {
        let path = self.entry_path(text, lang);
        if path.exists() {
            return Ok(path);
        }

        let intermediate = NamedTempFile::with_suffix_in(".mp3", &self.dir)?;
        self.synthesizer.synthesize(text, lang, intermediate.path())?;
        self.transcoder.transcode(intermediate.path(), &path)?;
        intermediate.close()?;

        self.logger
            .info(&format!("Synthesized speech asset: {}", path.display()));
        Ok(path)
    }

    /// Deterministic asset path for a `(text, lang)` pair.
    pub fn entry_path(&self, text: &str, lang: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(lang.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        let key = format!("{:x}", hasher.finalize());
        self.dir.join(format!("{}.wav", key))
    }
}
