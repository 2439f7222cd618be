//! Perception primitives: pixel sampling, color gating, debounced waits
//! and text-region segmentation. Everything here is stateless over a
//! captured frame; all screen knowledge lives in the callers' layout data.

pub mod color;
pub mod segment;
pub mod wait;

pub use color::{matches_any, sample_color, Checkpoint};
pub use segment::{find_text_block, TextScan};
pub use wait::{wait_for, wait_for_stable, WaitOutcome};
