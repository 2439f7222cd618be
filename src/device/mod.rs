//! Remote device control.
//!
//! The automation core talks to the device exclusively through the
//! [`DeviceChannel`] trait; [`adb::AdbChannel`] is the production
//! implementation speaking the ADB server TCP protocol.

pub mod adb;

pub use adb::AdbChannel;

use anyhow::Result;

/// One controllable device session.
///
/// All operations fail fast when the channel is not connected; retry and
/// backoff policy belongs to the caller. The session is single-use in the
/// sense that callers must check `is_connected` before calling `connect`
/// a second time. `disconnect` is idempotent.
pub trait DeviceChannel: Send {
    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Runs a shell command on the device and returns its captured output.
    fn shell(&mut self, cmd: &str) -> Result<String>;

    /// Captures the screen and returns the encoded image byte stream.
    fn capture_frame(&mut self) -> Result<Vec<u8>>;

    fn tap(&mut self, x: u32, y: u32) -> Result<()> {
        self.shell(&format!("input tap {} {}", x, y)).map(|_| ())
    }

    fn swipe(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> Result<()> {
        self.shell(&format!(
            "input swipe {} {} {} {} {}",
            x1, y1, x2, y2, duration_ms
        ))
        .map(|_| ())
    }
}

#[cfg(test)]
pub mod testing {
    //! Scriptable in-memory channel for unit tests.

    use super::*;
    use anyhow::anyhow;
    use image::RgbImage;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Recorded interactions and scripted behavior, shared behind an `Arc`
    /// so tests keep a probe after the channel moves into a context.
    #[derive(Default)]
    pub struct FakeState {
        pub connected: bool,
        pub fail_connect: bool,
        pub connect_calls: u32,
        pub disconnect_calls: u32,
        pub capture_calls: u32,
        pub shell_log: Vec<String>,
        pub shell_response: String,
        pub captures: VecDeque<Vec<u8>>,
    }

    pub struct FakeChannel {
        state: Arc<Mutex<FakeState>>,
    }

    pub fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("png encode");
        buf
    }

    impl FakeChannel {
        pub fn new() -> Self {
            Self::with_image(&RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255])))
        }

        pub fn with_image(img: &RgbImage) -> Self {
            Self::with_raw_captures(vec![encode_png(img)])
        }

        /// Captures are served front-to-back; the final payload repeats.
        pub fn with_images(imgs: &[RgbImage]) -> Self {
            Self::with_raw_captures(imgs.iter().map(encode_png).collect())
        }

        pub fn with_raw_captures(captures: Vec<Vec<u8>>) -> Self {
            let state = FakeState {
                captures: captures.into(),
                ..FakeState::default()
            };
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        /// Shared probe into the recorded state; survives moving the
        /// channel into a task context.
        pub fn probe(&self) -> Arc<Mutex<FakeState>> {
            self.state.clone()
        }

        pub fn set_fail_connect(&self, fail: bool) {
            self.state.lock().unwrap().fail_connect = fail;
        }

        pub fn set_shell_response(&self, response: &str) {
            self.state.lock().unwrap().shell_response = response.to_string();
        }

        pub fn capture_calls(&self) -> u32 {
            self.state.lock().unwrap().capture_calls
        }

        pub fn disconnect_calls(&self) -> u32 {
            self.state.lock().unwrap().disconnect_calls
        }

        pub fn shell_log(&self) -> Vec<String> {
            self.state.lock().unwrap().shell_log.clone()
        }
    }

    impl DeviceChannel for FakeChannel {
        fn connect(&mut self) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.connect_calls += 1;
            if state.fail_connect {
                return Err(anyhow!("simulated connect failure"));
            }
            state.connected = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.disconnect_calls += 1;
            state.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.state.lock().unwrap().connected
        }

        fn shell(&mut self, cmd: &str) -> Result<String> {
            let mut state = self.state.lock().unwrap();
            state.shell_log.push(cmd.to_string());
            Ok(state.shell_response.clone())
        }

        fn capture_frame(&mut self) -> Result<Vec<u8>> {
            let mut state = self.state.lock().unwrap();
            state.capture_calls += 1;
            match state.captures.len() {
                0 => Err(anyhow!("no capture queued")),
                1 => Ok(state.captures[0].clone()),
                _ => Ok(state.captures.pop_front().unwrap()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_tap_and_swipe_issue_input_shell_commands() {
            let mut channel = FakeChannel::new();
            channel.tap(616, 1532).unwrap();
            channel.swipe(100, 900, 100, 300, 500).unwrap();

            let log = channel.shell_log();
            assert_eq!(log[0], "input tap 616 1532");
            assert_eq!(log[1], "input swipe 100 900 100 300 500");
        }
    }
}
