//! Cooperative perception polling.
//!
//! Every iteration forces a fresh frame, evaluates the caller's condition
//! and sleeps the poll interval on a miss. The cancel token is checked at
//! the top of every iteration, so stop latency is bounded by the interval.

use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::capture::{Frame, ScreenshotCache};
use crate::device::DeviceChannel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached,
    TimedOut,
    Cancelled,
}

/// Polls until `condition` holds on a fresh frame.
///
/// `max_attempts` of `None` polls indefinitely; the expected state may
/// legitimately take minutes to appear and the cancel token is the way out.
pub fn wait_for(
    screenshots: &mut ScreenshotCache,
    channel: &mut dyn DeviceChannel,
    cancel: &CancelToken,
    interval: Duration,
    max_attempts: Option<u32>,
    condition: impl FnMut(&Frame) -> bool,
) -> WaitOutcome {
    wait_for_stable(screenshots, channel, cancel, interval, max_attempts, 1, condition)
}

/// Stability variant: requires `required_hits` *consecutive* positive
/// polls before declaring success, rejecting single-frame rendering
/// glitches. A miss or an absent frame resets the streak.
pub fn wait_for_stable(
    screenshots: &mut ScreenshotCache,
    channel: &mut dyn DeviceChannel,
    cancel: &CancelToken,
    interval: Duration,
    max_attempts: Option<u32>,
    required_hits: u32,
    mut condition: impl FnMut(&Frame) -> bool,
) -> WaitOutcome {
    let required_hits = required_hits.max(1);
    let mut hits = 0u32;
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return WaitOutcome::Cancelled;
        }

        match screenshots.fresh(channel) {
            Some(frame) if condition(frame) => {
                hits += 1;
                if hits >= required_hits {
                    return WaitOutcome::Reached;
                }
            }
            // A miss or a failed capture breaks the streak either way.
            _ => hits = 0,
        }

        attempts += 1;
        if let Some(max) = max_attempts {
            if attempts >= max {
                return WaitOutcome::TimedOut;
            }
        }

        thread::sleep(interval);
    }
}
