//! The task abstraction and the context it runs against.

use anyhow::Result;

use crate::cancel::CancelToken;
use crate::capture::ScreenshotCache;
use crate::config::AppConfig;
use crate::device::DeviceChannel;
use crate::logging::Logger;
use crate::ocr::TextRecognizer;
use crate::speech::{AudioPlayer, SpeechCache};

/// Everything a task may touch while it runs, constructed explicitly by
/// the embedding shell and handed to the scheduler. One screenshot cache
/// per channel lives here; tasks share it strictly sequentially.
pub struct TaskContext {
    pub channel: Box<dyn DeviceChannel>,
    pub screenshots: ScreenshotCache,
    pub config: AppConfig,
    pub recognizer: Box<dyn TextRecognizer>,
    pub speech: SpeechCache,
    pub player: Box<dyn AudioPlayer>,
    pub logger: Logger,
    pub cancel: CancelToken,
}

/// One scripted workflow. Tasks carry no state between runs; whatever a
/// run needs lives inside the `run` call.
///
/// `run` returns `Ok(true)` on success and `Ok(false)` on failure or a
/// cancelled run; an `Err` is caught at the scheduler boundary and
/// recorded as failure.
pub trait Task: Send {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Lower values execute earlier.
    fn priority(&self) -> i32;

    fn run(&mut self, ctx: &mut TaskContext) -> Result<bool>;
}

#[cfg(test)]
pub mod testing {
    //! Context assembly for unit tests.

    use super::*;
    use crate::speech::{AudioTranscoder, SpeechSynthesizer};
    use anyhow::Result;
    use image::RgbImage;
    use std::path::Path;

    pub struct FixedRecognizer(pub String);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &RgbImage) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    pub struct NullSynthesizer;

    impl SpeechSynthesizer for NullSynthesizer {
        fn synthesize(&self, text: &str, _lang: &str, output: &Path) -> Result<()> {
            std::fs::write(output, text.as_bytes())?;
            Ok(())
        }
    }

    pub struct CopyTranscoder;

    impl AudioTranscoder for CopyTranscoder {
        fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
            std::fs::copy(input, output)?;
            Ok(())
        }
    }

    pub struct NullPlayer;

    impl AudioPlayer for NullPlayer {
        fn play(&self, _asset: &Path) -> Result<()> {
            Ok(())
        }
    }

    /// A context around the given channel with inert collaborators. The
    /// speech cache lives in `speech_dir`, which the caller keeps alive.
    pub fn context(channel: Box<dyn DeviceChannel>, speech_dir: &Path) -> TaskContext {
        context_with(
            channel,
            speech_dir,
            Box::new(FixedRecognizer(String::new())),
            Box::new(NullPlayer),
        )
    }

    pub fn context_with(
        channel: Box<dyn DeviceChannel>,
        speech_dir: &Path,
        recognizer: Box<dyn TextRecognizer>,
        player: Box<dyn AudioPlayer>,
    ) -> TaskContext {
        let logger = Logger::disabled();
        TaskContext {
            channel,
            screenshots: ScreenshotCache::new(5, logger.clone()),
            config: AppConfig::default(),
            recognizer,
            speech: SpeechCache::new(
                speech_dir,
                Box::new(NullSynthesizer),
                Box::new(CopyTranscoder),
                logger.clone(),
            )
            .unwrap(),
            player,
            logger,
            cancel: CancelToken::new(),
        }
    }
}
