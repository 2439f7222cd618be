//! Point color sampling and exact-match gating.

use image::Rgb;

use crate::capture::Frame;

/// Reads the pixel color at `(x, y)`. Panics on out-of-range coordinates;
/// layout data pointing outside the frame is a programming error.
pub fn sample_color(frame: &Frame, x: u32, y: u32) -> Rgb<u8> {
    frame.color_at(x, y)
}

/// Exact equality against each candidate. The driven app renders flat UI
/// colors, so no tolerance is applied.
pub fn matches_any(color: Rgb<u8>, candidates: &[Rgb<u8>]) -> bool {
    candidates.contains(&color)
}

/// A named screen coordinate with the color(s) that signal a semantic UI
/// state. Fixed configuration data, defined at task construction.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub label: &'static str,
    pub x: u32,
    pub y: u32,
    pub colors: Vec<Rgb<u8>>,
}

impl Checkpoint {
    pub fn new(label: &'static str, x: u32, y: u32, color: Rgb<u8>) -> Self {
        Self {
            label,
            x,
            y,
            colors: vec![color],
        }
    }

    /// Samples the checkpoint position and matches against the candidate set.
    pub fn is_met(&self, frame: &Frame) -> bool {
        matches_any(sample_color(frame, self.x, self.y), &self.colors)
    }
}
