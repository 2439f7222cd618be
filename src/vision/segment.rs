//! Text-region segmentation.
//!
//! The driven app reveals subtitle text progressively and surrounds it
//! with background once rendering settles. A single greedy pass grows a
//! candidate block downward in fixed row steps, resetting whenever a strip
//! carries a scoring-highlight color, and finishes when a fully rendered
//! block is followed by a clear band of background.

use image::Rgb;

use crate::capture::{Frame, Region};

/// Scan parameters: where to look, how tall each strip is, which colors
/// disqualify a strip and what counts as background.
#[derive(Clone, Debug)]
pub struct TextScan {
    pub region: Region,
    pub step: u32,
    pub unexpected: Vec<Rgb<u8>>,
    pub background: Rgb<u8>,
}

/// Locates the first fully rendered, non-highlighted text block inside the
/// scan region. Returns `None` when the bottom bound is reached without a
/// finished block.
pub fn find_text_block(frame: &Frame, scan: &TextScan) -> Option<Region> {
    let Region {
        top,
        bottom,
        left,
        right,
    } = scan.region;
    assert!(
        right <= frame.width() && bottom <= frame.height(),
        "scan region ({}, {}) exceeds {}x{} frame",
        right,
        bottom,
        frame.width(),
        frame.height()
    );
    let step = scan.step.max(1);

    let mut head = top;
    let mut tail = top;

    while tail < bottom {
        let strip_top = tail;
        tail = (tail + step).min(bottom);

        // A highlight or pure-black pixel in the new strip means the app is
        // still rendering score decorations here; restart below it.
        if rows_contain_any(frame, left, right, strip_top, tail, &scan.unexpected) {
            head = tail;
            continue;
        }

        if tail - head >= 2 * step {
            if rows_all_background(frame, left, right, head, tail, scan.background) {
                // An all-background block cannot be text.
                head = tail;
                continue;
            }

            // Finished once the two-step band above the bottom edge is clear;
            // the block itself excludes that trailing band.
            let band_top = tail - 2 * step;
            if rows_all_background(frame, left, right, band_top, tail, scan.background) {
                return Some(Region {
                    top: head,
                    bottom: band_top,
                    left,
                    right,
                });
            }
        }
    }

    None
}

fn rows_contain_any(
    frame: &Frame,
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    colors: &[Rgb<u8>],
) -> bool {
    for y in top..bottom {
        for x in left..right {
            if colors.contains(&frame.color_at(x, y)) {
                return true;
            }
        }
    }
    false
}

fn rows_all_background(
    frame: &Frame,
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    background: Rgb<u8>,
) -> bool {
    for y in top..bottom {
        for x in left..right {
            if frame.color_at(x, y) != background {
                return false;
            }
        }
    }
    true
}
