//! Listen-and-speak homework workflow.
//!
//! A state machine that navigates into the first pending homework item,
//! waits for it to load, classifies which of the two homework variants is
//! on screen, and in follow mode loops per sentence: wait for the peer
//! reading, recognize the subtitle, synthesize it, wait for the device to
//! start recording, play the audio back, advance.
//!
//! Navigation relies on fixed delays rather than acknowledgments, and the
//! per-sentence loop has no terminal condition of its own; both carry
//! over from the app's behavior and are deliberately left as-is.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::capture::Region;
use crate::ocr::clean_recognized_text;
use crate::vision::segment::TextScan;
use crate::vision::wait::{wait_for, wait_for_stable, WaitOutcome};
use crate::vision::Checkpoint;
use super::task::{Task, TaskContext};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Fixed screen layout of the homework flow, in device pixels. The app
/// renders at a fixed resolution, so positions and colors are data, not
/// discovery.
#[derive(Clone, Debug)]
pub struct HomeworkLayout {
    pub homework_tab: (u32, u32),
    pub first_pending: (u32, u32),
    pub start_homework: (u32, u32),
    pub tab_delay: Duration,
    pub item_delay: Duration,
    pub start_delay: Duration,

    /// Turns white once the workload has finished loading.
    pub workload_ready: Checkpoint,
    pub ready_hits: u32,
    pub ready_poll: Duration,

    /// White here means follow mode; anything else is read mode.
    pub mode_follow: Checkpoint,

    pub pause_button: (u32, u32),
    /// Fast-read toggle; the checkpoint color is its active state.
    pub fast_read: Checkpoint,
    pub prepare_delay: Duration,

    /// Both white while the peer recording is playing.
    pub peer_speaking: [Checkpoint; 2],
    pub peer_poll: Duration,

    pub subtitle_scan: TextScan,

    /// Red while the device is capturing microphone input.
    pub recording_active: Checkpoint,
    pub recording_poll: Duration,

    /// Appears once a sentence is scored; tapping it advances.
    pub finish_button: Checkpoint,
}

impl Default for HomeworkLayout {
    fn default() -> Self {
        Self {
            homework_tab: (616, 1532),
            first_pending: (742, 992),
            start_homework: (454, 1528),
            tab_delay: Duration::from_secs(5),
            item_delay: Duration::from_secs(5),
            start_delay: Duration::from_secs(1),

            workload_ready: Checkpoint::new("workload ready", 268, 1472, WHITE),
            ready_hits: 3,
            ready_poll: Duration::from_millis(200),

            mode_follow: Checkpoint::new("follow-mode marker", 826, 1548, WHITE),

            pause_button: (458, 1434),
            fast_read: Checkpoint::new("fast-read active", 200, 1408, Rgb([48, 138, 245])),
            prepare_delay: Duration::from_secs(1),

            peer_speaking: [
                Checkpoint::new("peer speaking A", 463, 1450, WHITE),
                Checkpoint::new("peer speaking B", 436, 1411, WHITE),
            ],
            peer_poll: Duration::from_millis(70),

            subtitle_scan: TextScan {
                region: Region {
                    top: 245,
                    bottom: 1243,
                    left: 146,
                    right: 844,
                },
                step: 29,
                // Score highlight colors plus pure black; a strip carrying
                // any of these is still being decorated.
                unexpected: vec![
                    Rgb([245, 253, 248]),
                    Rgb([29, 219, 88]),
                    Rgb([255, 167, 2]),
                    Rgb([255, 82, 82]),
                    Rgb([0, 0, 0]),
                ],
                background: WHITE,
            },

            recording_active: Checkpoint::new("recording active", 450, 1432, Rgb([255, 57, 67])),
            recording_poll: Duration::from_millis(50),

            finish_button: Checkpoint::new("sentence finished", 652, 1556, Rgb([54, 143, 255])),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum HomeworkState {
    Idle,
    Navigating,
    AwaitingWorkloadReady,
    ClassifyingMode,
    PreparingFollow,
    AwaitingPeerSpeech,
    RecognizingSentence,
    AwaitingRecording,
    PlayingSentence,
    AdvancingSentence,
    ReadingAloud,
    Finishing,
    Done,
    Cancelled,
    Failed(String),
}

pub struct HomeworkTask {
    pub layout: HomeworkLayout,
}

impl HomeworkTask {
    pub fn new() -> Self {
        Self {
            layout: HomeworkLayout::default(),
        }
    }
}

impl Default for HomeworkTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for HomeworkTask {
    fn name(&self) -> &str {
        "listen-and-speak homework"
    }

    fn description(&self) -> &str {
        "Completes the pending listen-and-speak homework set"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn run(&mut self, ctx: &mut TaskContext) -> Result<bool> {
        ctx.logger.info("Starting the listen-and-speak homework");

        let mut flow = HomeworkFlow {
            layout: self.layout.clone(),
            state: HomeworkState::Idle,
            audio: None,
            sentences_done: 0,
        };

        loop {
            match flow.step(ctx) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    flow.state = HomeworkState::Failed(e.to_string());
                    break;
                }
            }
        }

        match flow.state {
            HomeworkState::Done => {
                ctx.logger.info("Homework task finished");
                Ok(true)
            }
            HomeworkState::Cancelled => {
                ctx.logger.info(&format!(
                    "Homework task cancelled after {} sentence(s)",
                    flow.sentences_done
                ));
                Ok(false)
            }
            HomeworkState::Failed(msg) => Err(anyhow!(msg)),
            _ => Ok(false),
        }
    }
}

/// Per-run workflow state. Discarded when the run returns.
struct HomeworkFlow {
    layout: HomeworkLayout,
    state: HomeworkState,
    /// Synthesized asset for the current sentence, if any.
    audio: Option<PathBuf>,
    sentences_done: u32,
}

impl HomeworkFlow {
    /// Advances the machine by one state. Returns `Ok(true)` to keep
    /// stepping, `Ok(false)` once a terminal state is reached.
    fn step(&mut self, ctx: &mut TaskContext) -> Result<bool> {
        if ctx.cancel.is_cancelled() {
            self.state = HomeworkState::Cancelled;
            return Ok(false);
        }

        match &self.state {
            HomeworkState::Idle => {
                self.state = HomeworkState::Navigating;
                Ok(true)
            }

            HomeworkState::Navigating => {
                // Fixed delays, no acknowledgment from the app.
                ctx.logger.info("Opening the homework tab...");
                let (x, y) = self.layout.homework_tab;
                ctx.channel.tap(x, y)?;
                thread::sleep(self.layout.tab_delay);

                ctx.logger.info("Opening the first pending homework...");
                let (x, y) = self.layout.first_pending;
                ctx.channel.tap(x, y)?;
                thread::sleep(self.layout.item_delay);

                ctx.logger.info("Starting the homework...");
                let (x, y) = self.layout.start_homework;
                ctx.channel.tap(x, y)?;
                thread::sleep(self.layout.start_delay);

                self.state = HomeworkState::AwaitingWorkloadReady;
                Ok(true)
            }

            HomeworkState::AwaitingWorkloadReady => {
                ctx.logger.info("Waiting for the homework to load...");
                let checkpoint = &self.layout.workload_ready;
                let outcome = wait_for_stable(
                    &mut ctx.screenshots,
                    ctx.channel.as_mut(),
                    &ctx.cancel,
                    self.layout.ready_poll,
                    None,
                    self.layout.ready_hits,
                    |frame| checkpoint.is_met(frame),
                );
                match outcome {
                    WaitOutcome::Reached => {
                        ctx.logger.info("Homework loaded");
                        self.state = HomeworkState::ClassifyingMode;
                        Ok(true)
                    }
                    WaitOutcome::Cancelled => {
                        self.state = HomeworkState::Cancelled;
                        Ok(false)
                    }
                    WaitOutcome::TimedOut => {
                        self.state =
                            HomeworkState::Failed("load wait timed out".to_string());
                        Ok(false)
                    }
                }
            }

            HomeworkState::ClassifyingMode => {
                // One pixel decides between the two variants; an absent
                // frame or an unmatched color falls into the read branch.
                let follow = ctx
                    .screenshots
                    .fresh(ctx.channel.as_mut())
                    .is_some_and(|frame| self.layout.mode_follow.is_met(frame));
                if follow {
                    ctx.logger.info("Homework variant: follow (repeat after the peer)");
                    self.state = HomeworkState::PreparingFollow;
                } else {
                    ctx.logger.info("Homework variant: read aloud");
                    self.state = HomeworkState::ReadingAloud;
                }
                Ok(true)
            }

            HomeworkState::PreparingFollow => {
                let (x, y) = self.layout.pause_button;
                ctx.channel.tap(x, y)?;

                let needs_toggle = ctx
                    .screenshots
                    .fresh(ctx.channel.as_mut())
                    .is_some_and(|frame| !self.layout.fast_read.is_met(frame));
                if needs_toggle {
                    let (fx, fy) = (self.layout.fast_read.x, self.layout.fast_read.y);
                    ctx.channel.tap(fx, fy)?;
                    ctx.logger.info("Enabled fast-read mode");
                }
                thread::sleep(self.layout.prepare_delay);

                ctx.channel.tap(x, y)?;
                self.state = HomeworkState::AwaitingPeerSpeech;
                Ok(true)
            }

            HomeworkState::AwaitingPeerSpeech => {
                let gates = &self.layout.peer_speaking;
                let outcome = wait_for(
                    &mut ctx.screenshots,
                    ctx.channel.as_mut(),
                    &ctx.cancel,
                    self.layout.peer_poll,
                    None,
                    |frame| gates.iter().all(|g| g.is_met(frame)),
                );
                match outcome {
                    WaitOutcome::Reached => {
                        ctx.logger.info("Peer reading started");
                        self.state = HomeworkState::RecognizingSentence;
                        Ok(true)
                    }
                    WaitOutcome::Cancelled => {
                        self.state = HomeworkState::Cancelled;
                        Ok(false)
                    }
                    WaitOutcome::TimedOut => {
                        self.state =
                            HomeworkState::Failed("peer speech wait timed out".to_string());
                        Ok(false)
                    }
                }
            }

            HomeworkState::RecognizingSentence => {
                let cropped: Option<RgbImage> =
                    match ctx.screenshots.fresh(ctx.channel.as_mut()) {
                        Some(frame) => {
                            match crate::vision::find_text_block(frame, &self.layout.subtitle_scan)
                            {
                                Some(block) => {
                                    ctx.logger.info(&format!(
                                        "Found subtitle block: rows {}..{}",
                                        block.top, block.bottom
                                    ));
                                    Some(frame.crop(&block))
                                }
                                None => None,
                            }
                        }
                        None => None,
                    };

                let sentence = match cropped {
                    Some(image) => match ctx.recognizer.recognize(&image) {
                        Ok(raw) => clean_recognized_text(&raw),
                        Err(e) => {
                            ctx.logger.error(&format!("Recognition failed: {}", e));
                            String::new()
                        }
                    },
                    None => {
                        ctx.logger
                            .warn("No settled subtitle block inside the scan region");
                        String::new()
                    }
                };

                // Degraded input: an empty sentence still goes through the
                // gate sequencing, it just has nothing to play.
                self.audio = if sentence.is_empty() {
                    ctx.logger.warn("Sentence recognition came up empty");
                    None
                } else {
                    ctx.logger.info(&format!("Current sentence: {}", sentence));
                    match ctx.speech.synthesize(&sentence, &ctx.config.tts.language) {
                        Ok(path) => Some(path),
                        Err(e) => {
                            ctx.logger.error(&format!("Speech synthesis failed: {}", e));
                            None
                        }
                    }
                };

                self.state = HomeworkState::AwaitingRecording;
                Ok(true)
            }

            HomeworkState::AwaitingRecording => {
                // Hard synchronization point: playback must not start
                // before the device signals it is capturing audio.
                let checkpoint = &self.layout.recording_active;
                let outcome = wait_for(
                    &mut ctx.screenshots,
                    ctx.channel.as_mut(),
                    &ctx.cancel,
                    self.layout.recording_poll,
                    None,
                    |frame| checkpoint.is_met(frame),
                );
                match outcome {
                    WaitOutcome::Reached => {
                        ctx.logger.info("Device is recording");
                        self.state = HomeworkState::PlayingSentence;
                        Ok(true)
                    }
                    WaitOutcome::Cancelled => {
                        self.state = HomeworkState::Cancelled;
                        Ok(false)
                    }
                    WaitOutcome::TimedOut => {
                        self.state =
                            HomeworkState::Failed("recording wait timed out".to_string());
                        Ok(false)
                    }
                }
            }

            HomeworkState::PlayingSentence => {
                match &self.audio {
                    Some(asset) => match ctx.player.play(asset) {
                        Ok(()) => ctx.logger.info("Playback finished"),
                        Err(e) => ctx.logger.error(&format!("Playback failed: {}", e)),
                    },
                    None => ctx.logger.warn("Nothing to play for this sentence"),
                }
                self.state = HomeworkState::AdvancingSentence;
                Ok(true)
            }

            HomeworkState::AdvancingSentence => {
                let finished = ctx
                    .screenshots
                    .fresh(ctx.channel.as_mut())
                    .is_some_and(|frame| self.layout.finish_button.is_met(frame));
                if finished {
                    let (x, y) = (self.layout.finish_button.x, self.layout.finish_button.y);
                    ctx.channel.tap(x, y)?;
                    self.sentences_done += 1;
                    ctx.logger.info(&format!(
                        "Sentence {} done, moving to the next one",
                        self.sentences_done
                    ));
                }
                self.audio = None;
                self.state = HomeworkState::AwaitingPeerSpeech;
                Ok(true)
            }

            HomeworkState::ReadingAloud => {
                ctx.logger
                    .warn("Read-aloud homework is not automated; leaving it for manual completion");
                self.state = HomeworkState::Finishing;
                Ok(true)
            }

            HomeworkState::Finishing => {
                self.state = HomeworkState::Done;
                Ok(true)
            }

            HomeworkState::Done | HomeworkState::Cancelled | HomeworkState::Failed(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::task::testing::{context_with, FixedRecognizer, NullPlayer};
    use crate::cancel::CancelToken;
    use crate::device::testing::FakeChannel;
    use crate::speech::AudioPlayer;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    const GRAY: Rgb<u8> = Rgb([200, 200, 200]);

    fn fast_layout() -> HomeworkLayout {
        let mut layout = HomeworkLayout::default();
        layout.tab_delay = Duration::from_millis(1);
        layout.item_delay = Duration::from_millis(1);
        layout.start_delay = Duration::from_millis(1);
        layout.ready_poll = Duration::from_millis(1);
        layout.prepare_delay = Duration::from_millis(1);
        layout.peer_poll = Duration::from_millis(1);
        layout.recording_poll = Duration::from_millis(1);
        layout
    }

    fn fast_task() -> HomeworkTask {
        HomeworkTask {
            layout: fast_layout(),
        }
    }

    /// A plain white device screen; individual pixels are painted per test.
    fn white_screen() -> RgbImage {
        RgbImage::from_pixel(900, 1600, WHITE)
    }

    struct CountingPlayer(Arc<AtomicU32>);

    impl AudioPlayer for CountingPlayer {
        fn play(&self, _asset: &Path) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Returns the same text every call and fires the cancel token on the
    /// second invocation, so exactly one follow cycle runs end to end.
    struct SecondCallCancels {
        text: String,
        calls: Arc<AtomicU32>,
        cancel: CancelToken,
    }

    impl crate::ocr::TextRecognizer for SecondCallCancels {
        fn recognize(&self, _image: &RgbImage) -> anyhow::Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= 1 {
                self.cancel.cancel();
            }
            Ok(self.text.clone())
        }
    }

    #[test]
    fn test_non_white_classifier_selects_read_branch() {
        // White gates everywhere, debounce satisfied by consecutive white
        // polls, but the classifier pixel is not white: the read branch
        // must be chosen and the task completes.
        let mut screen = white_screen();
        screen.put_pixel(826, 1548, GRAY);

        let dir = tempdir().unwrap();
        let channel = FakeChannel::with_image(&screen);
        let probe = channel.probe();
        let mut ctx = context_with(
            Box::new(channel),
            dir.path(),
            Box::new(FixedRecognizer(String::new())),
            Box::new(NullPlayer),
        );

        let result = fast_task().run(&mut ctx).unwrap();
        assert!(result);

        let log = probe.lock().unwrap().shell_log.clone();
        assert_eq!(
            log,
            vec![
                "input tap 616 1532",
                "input tap 742 992",
                "input tap 454 1528",
            ]
        );
        // Debounce needs at least three polls, classification one more.
        assert!(probe.lock().unwrap().capture_calls >= 4);
    }

    #[test]
    fn test_follow_cycle_recognizes_synthesizes_and_plays_once() {
        let mut screen = white_screen();
        // Fast-read already active, so preparation must not toggle it.
        screen.put_pixel(200, 1408, Rgb([48, 138, 245]));
        // Subtitle text inside the scan region.
        for y in 300..312 {
            screen.put_pixel(400, y, Rgb([40, 40, 40]));
        }
        // Recording gate and finish marker.
        screen.put_pixel(450, 1432, Rgb([255, 57, 67]));
        screen.put_pixel(652, 1556, Rgb([54, 143, 255]));

        let dir = tempdir().unwrap();
        let channel = FakeChannel::with_image(&screen);
        let probe = channel.probe();
        let plays = Arc::new(AtomicU32::new(0));
        let recognitions = Arc::new(AtomicU32::new(0));
        let cancel = CancelToken::new();
        let mut ctx = context_with(
            Box::new(channel),
            dir.path(),
            Box::new(SecondCallCancels {
                text: "Sentence 1/8\nGood  morning\neveryone".to_string(),
                calls: recognitions.clone(),
                cancel: cancel.clone(),
            }),
            Box::new(CountingPlayer(plays.clone())),
        );
        ctx.cancel = cancel;

        // The recognizer cancels the run at the start of the second cycle,
        // so exactly one cycle executes end to end.
        let result = fast_task().run(&mut ctx).unwrap();
        assert!(!result);
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert_eq!(recognitions.load(Ordering::SeqCst), 2);

        // The cleaned sentence landed in the speech cache.
        assert!(ctx.speech.entry_path("Good morning everyone", "en").exists());

        let log = probe.lock().unwrap().shell_log.clone();
        assert_eq!(
            log,
            vec![
                "input tap 616 1532",
                "input tap 742 992",
                "input tap 454 1528",
                "input tap 458 1434",
                "input tap 458 1434",
                "input tap 652 1556",
            ]
        );
    }

    #[test]
    fn test_follow_without_subtitle_plays_nothing() {
        // Follow mode with a blank subtitle region: the cycle degrades to
        // an empty sentence, skips synthesis and playback, and keeps
        // looping until cancelled from outside.
        let mut screen = white_screen();
        screen.put_pixel(200, 1408, Rgb([48, 138, 245]));
        screen.put_pixel(450, 1432, Rgb([255, 57, 67]));

        let dir = tempdir().unwrap();
        let channel = FakeChannel::with_image(&screen);
        let plays = Arc::new(AtomicU32::new(0));

        let mut ctx = context_with(
            Box::new(channel),
            dir.path(),
            Box::new(FixedRecognizer(String::new())),
            Box::new(CountingPlayer(plays.clone())),
        );

        let cancel = ctx.cancel.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            cancel.cancel();
        });

        let result = fast_task().run(&mut ctx).unwrap();
        stopper.join().unwrap();

        assert!(!result);
        assert_eq!(plays.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_during_peer_wait_stops_cleanly() {
        // Follow mode but the peer gate never opens; cancellation must be
        // observed inside the wait loop.
        let mut screen = white_screen();
        screen.put_pixel(463, 1450, GRAY);

        let dir = tempdir().unwrap();
        let channel = FakeChannel::with_image(&screen);
        let mut ctx = context_with(
            Box::new(channel),
            dir.path(),
            Box::new(FixedRecognizer(String::new())),
            Box::new(NullPlayer),
        );

        let cancel = ctx.cancel.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            cancel.cancel();
        });

        let result = fast_task().run(&mut ctx).unwrap();
        stopper.join().unwrap();
        assert!(!result);
    }
}
