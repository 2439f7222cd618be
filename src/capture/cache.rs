//! Age-gated screenshot cache.
//!
//! One cache per device channel. Callers either accept a recent cached
//! frame or force a new capture; a failed capture or decode leaves the
//! previous entry untouched so the caller decides whether stale data is
//! acceptable.

use std::time::Duration;

use crate::device::DeviceChannel;
use crate::logging::Logger;
use super::Frame;

pub struct ScreenshotCache {
    last_frame: Option<Frame>,
    default_max_age: Duration,
    logger: Logger,
}

impl ScreenshotCache {
    /// `fps` is the configured polling rate; the default max-age for
    /// non-forced reads is one frame period (`1000 / fps` ms).
    pub fn new(fps: u32, logger: Logger) -> Self {
        Self {
            last_frame: None,
            default_max_age: Duration::from_millis(1000 / u64::from(fps.max(1))),
            logger,
        }
    }

    /// Returns a frame no older than `max_age`, capturing a new one when
    /// forced or when the cached frame is missing or too old. Returns
    /// `None` when capture or decode fails and no fresh-enough frame is
    /// cached.
    pub fn frame(
        &mut self,
        channel: &mut dyn DeviceChannel,
        force_new: bool,
        max_age: Duration,
    ) -> Option<&Frame> {
        let cached_is_fresh = self
            .last_frame
            .as_ref()
            .is_some_and(|f| f.age() < max_age);

        if !force_new && cached_is_fresh {
            return self.last_frame.as_ref();
        }

        match channel.capture_frame() {
            Ok(raw) => match Frame::decode(&raw) {
                Ok(frame) => {
                    self.last_frame = Some(frame);
                    self.last_frame.as_ref()
                }
                Err(e) => {
                    self.logger.error(&format!("Screenshot decode failed: {}", e));
                    None
                }
            },
            Err(e) => {
                self.logger.error(&format!("Screen capture failed: {}", e));
                None
            }
        }
    }

    /// Forces a new capture.
    pub fn fresh(&mut self, channel: &mut dyn DeviceChannel) -> Option<&Frame> {
        let max_age = self.default_max_age;
        self.frame(channel, true, max_age)
    }
}
