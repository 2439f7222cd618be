//! Application configuration.
//!
//! Settings are grouped by section and stored as JSON next to the
//! executable. A missing file is created with defaults on first run; an
//! unparsable file falls back to defaults without overwriting it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::logging::Logger;

/// ADB server endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdbConfig {
    #[serde(default = "default_adb_host")]
    pub host: String,
    #[serde(default = "default_adb_port")]
    pub port: u16,
}

fn default_adb_host() -> String {
    "127.0.0.1".to_string()
}

fn default_adb_port() -> u16 {
    5037
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            host: default_adb_host(),
            port: default_adb_port(),
        }
    }
}

/// Screenshot polling rate. The cache's default max-age is `1000 / fps` ms.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    5
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

/// Speech synthesis and playback commands.
///
/// The synthesizer, transcoder and player are external programs; only the
/// language tag is interpreted by this process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_language")]
    pub language: String,
    #[serde(default = "default_synthesizer_cmd")]
    pub synthesizer_cmd: String,
    #[serde(default = "default_transcoder_cmd")]
    pub transcoder_cmd: String,
    #[serde(default = "default_player_cmd")]
    pub player_cmd: String,
}

fn default_tts_language() -> String {
    "en".to_string()
}

fn default_synthesizer_cmd() -> String {
    "gtts-cli".to_string()
}

fn default_transcoder_cmd() -> String {
    "ffmpeg".to_string()
}

fn default_player_cmd() -> String {
    "aplay".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: default_tts_language(),
            synthesizer_cmd: default_synthesizer_cmd(),
            transcoder_cmd: default_transcoder_cmd(),
            player_cmd: default_player_cmd(),
        }
    }
}

/// Text-recognition engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_language")]
    pub language: String,
    #[serde(default = "default_engine_path")]
    pub engine_path: String,
    /// Pixels with luma above this become text (black) after inverse
    /// binarization; everything else becomes background (white).
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_engine_path() -> String {
    "tesseract".to_string()
}

fn default_binarize_threshold() -> u8 {
    240
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_ocr_language(),
            engine_path: default_engine_path(),
            binarize_threshold: default_binarize_threshold(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbConfig,
    #[serde(default)]
    pub screenshot: ScreenshotConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

impl AppConfig {
    /// Loads configuration from `path`, creating the file with defaults if
    /// it does not exist. A file that exists but cannot be read or parsed
    /// falls back to defaults and is left untouched.
    pub fn load_or_create(path: &Path, logger: &Logger) -> AppConfig {
        if !path.exists() {
            logger.info("Config file not found, creating defaults");
            let config = AppConfig::default();
            if let Err(e) = config.save(path) {
                logger.error(&format!("Failed to write default config: {}", e));
            }
            return config;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    logger.info(&format!("Config loaded from {}", path.display()));
                    config
                }
                Err(e) => {
                    logger.error(&format!("Failed to parse config: {}. Using defaults.", e));
                    AppConfig::default()
                }
            },
            Err(e) => {
                logger.error(&format!("Failed to read config: {}. Using defaults.", e));
                AppConfig::default()
            }
        }
    }

    /// Persists the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
