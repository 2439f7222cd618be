//! Decoded screenshot frames.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::time::{Duration, Instant};

/// An axis-aligned rectangle in frame pixel coordinates.
///
/// Bounds are half-open: rows `[top, bottom)`, columns `[left, right)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Region {
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }
}

/// One decoded screenshot: an immutable RGB pixel grid plus its capture
/// time. Never mutated after decode; callers only ever see shared views.
pub struct Frame {
    image: RgbImage,
    captured_at: Instant,
}

impl Frame {
    /// Decodes an encoded screenshot byte stream into an RGB frame.
    ///
    /// Whatever channel order the source encoding uses, the decoded frame
    /// is normalized to RGB.
    pub fn decode(raw: &[u8]) -> Result<Frame> {
        let image = image::load_from_memory(raw)
            .context("failed to decode screenshot")?
            .to_rgb8();
        Ok(Frame {
            image,
            captured_at: Instant::now(),
        })
    }

    #[cfg(test)]
    pub fn from_image(image: RgbImage) -> Frame {
        Frame {
            image,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    /// Reads the pixel at `(x, y)`.
    ///
    /// Out-of-range coordinates are a programming error and panic; screen
    /// layouts are fixed data and must never point outside the frame.
    pub fn color_at(&self, x: u32, y: u32) -> Rgb<u8> {
        assert!(
            x < self.image.width() && y < self.image.height(),
            "pixel ({}, {}) outside {}x{} frame",
            x,
            y,
            self.image.width(),
            self.image.height()
        );
        *self.image.get_pixel(x, y)
    }

    /// Copies the given region out of the frame.
    pub fn crop(&self, region: &Region) -> RgbImage {
        image::imageops::crop_imm(
            &self.image,
            region.left,
            region.top,
            region.width(),
            region.height(),
        )
        .to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::encode_png;

    #[test]
    fn test_decode_normalizes_to_rgb() {
        let mut img = RgbImage::from_pixel(4, 3, Rgb([255, 255, 255]));
        img.put_pixel(2, 1, Rgb([10, 20, 30]));

        let frame = Frame::decode(&encode_png(&img)).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.color_at(2, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Frame::decode(b"definitely not an image").is_err());
        assert!(Frame::decode(b"").is_err());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_color_at_out_of_range_panics() {
        let frame = Frame::from_image(RgbImage::new(2, 2));
        frame.color_at(2, 0);
    }

    #[test]
    fn test_crop() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        img.put_pixel(3, 4, Rgb([9, 9, 9]));
        let frame = Frame::from_image(img);

        let cropped = frame.crop(&Region {
            top: 4,
            bottom: 6,
            left: 3,
            right: 8,
        });
        assert_eq!(cropped.dimensions(), (5, 2));
        assert_eq!(*cropped.get_pixel(0, 0), Rgb([9, 9, 9]));
    }
}
