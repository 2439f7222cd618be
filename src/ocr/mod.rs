//! Text recognition boundary.
//!
//! The engine itself is a black box behind [`TextRecognizer`]; this module
//! owns the preprocessing applied before the engine sees the image and the
//! cleanup applied to whatever string comes back.

use anyhow::{anyhow, Result};
use image::{GrayImage, Luma, RgbImage};
use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use tempfile::NamedTempFile;

use crate::config::OcrConfig;
use crate::logging::Logger;

/// Black-box text recognition: image in, recognized string out.
pub trait TextRecognizer: Send {
    fn recognize(&self, image: &RgbImage) -> Result<String>;
}

/// Inverse binarization: bright pixels (luma above `threshold`) become
/// black text, everything else becomes white background. The subtitle text
/// is rendered near-white on the app's colored card, so this isolates it.
pub fn binarize_light_text(img: &RgbImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let luma = (0.299 * f32::from(pixel[0])
            + 0.587 * f32::from(pixel[1])
            + 0.114 * f32::from(pixel[2])) as u8;
        let value = if luma > threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Cleans an engine result for speech synthesis: drops the leading label
/// line when the text spans several lines, folds the remaining line breaks
/// and whitespace runs into single spaces, and substitutes the `|` glyph
/// the engine habitually reads instead of `I`.
pub fn clean_recognized_text(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let body = match raw.split_once('\n') {
        Some((_label, rest)) => rest,
        None => raw,
    };
    let body = body.replace('|', "I");
    whitespace.replace_all(body.trim(), " ").into_owned()
}

/// Subprocess-backed recognizer invoking an external engine binary
/// (Tesseract-compatible command line) on a preprocessed temp image.
pub struct TesseractRecognizer {
    executable: PathBuf,
    language: String,
    binarize_threshold: u8,
    logger: Logger,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig, logger: Logger) -> Self {
        Self {
            executable: PathBuf::from(&config.engine_path),
            language: config.language.clone(),
            binarize_threshold: config.binarize_threshold,
            logger,
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &RgbImage) -> Result<String> {
        let preprocessed = binarize_light_text(image, self.binarize_threshold);

        let temp_input = NamedTempFile::with_suffix(".png")?;
        preprocessed.save(temp_input.path())?;

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .args(["--oem", "3", "--psm", "3", "-l", self.language.as_str()])
            .output()
            .map_err(|e| anyhow!("failed to launch {}: {}", self.executable.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("recognition engine failed: {}", stderr));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            self.logger.warn("Recognition engine returned no text");
        }
        Ok(text)
    }
}
