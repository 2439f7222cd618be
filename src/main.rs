//! etspilot
//!
//! Automates the ETS listen-and-speak homework on a remote Android device:
//! drives the app over the ADB TCP protocol, reads on-screen state from
//! pixel samples of periodic screenshots, recognizes subtitle text, and
//! plays synthesized speech into the device's recording path.
//!
//! This binary is the headless shell: it loads configuration, builds the
//! task registry and runs the scheduler, printing the event stream. A
//! front-end embedding the same components would hold the cancel token.

mod automation;
mod cancel;
mod capture;
mod config;
mod device;
mod logging;
mod ocr;
mod paths;
mod speech;
mod vision;

use anyhow::{anyhow, Result};
use std::sync::mpsc;

use automation::scheduler::{spawn_run, Scheduler, SchedulerEvent};
use automation::task::TaskContext;
use automation::TaskRegistry;
use cancel::CancelToken;
use capture::ScreenshotCache;
use config::AppConfig;
use device::AdbChannel;
use logging::Logger;
use ocr::TesseractRecognizer;
use speech::{CommandPlayer, CommandSynthesizer, CommandTranscoder, SpeechCache};

fn main() -> Result<()> {
    paths::ensure_directories()?;
    let logger = Logger::new(&paths::get_logs_dir());
    let config = AppConfig::load_or_create(&paths::get_config_path(), &logger);

    logger.info(&format!(
        "Device endpoint: {}:{}",
        config.adb.host, config.adb.port
    ));

    let registry = TaskRegistry::with_builtin_tasks();
    let ids = registry.ids();
    logger.info(&format!("Registered tasks: {}", ids.join(", ")));
    let tasks = registry.instantiate(&ids);

    let cancel = CancelToken::new();
    spawn_stop_watcher(cancel.clone(), logger.clone());
    let speech = SpeechCache::new(
        &paths::get_speech_cache_dir(),
        Box::new(CommandSynthesizer::new(&config.tts.synthesizer_cmd)),
        Box::new(CommandTranscoder::new(&config.tts.transcoder_cmd)),
        logger.clone(),
    )?;
    let ctx = TaskContext {
        channel: Box::new(AdbChannel::new(&config.adb, logger.clone())),
        screenshots: ScreenshotCache::new(config.screenshot.fps, logger.clone()),
        recognizer: Box::new(TesseractRecognizer::new(&config.ocr, logger.clone())),
        player: Box::new(CommandPlayer::new(&config.tts.player_cmd)),
        speech,
        config,
        logger: logger.clone(),
        cancel: cancel.clone(),
    };

    let (events_tx, events_rx) = mpsc::channel();
    let scheduler = Scheduler::new().with_events(events_tx);
    let handle = spawn_run(scheduler, tasks, ctx);

    for event in events_rx {
        match event {
            SchedulerEvent::TaskFinished { name, success } => {
                let verdict = if success { "success" } else { "failure" };
                logger.info(&format!("Task '{}' finished: {}", name, verdict));
            }
            SchedulerEvent::RunFinished => break,
        }
    }

    let reports = handle
        .join()
        .map_err(|_| anyhow!("scheduler worker panicked"))?;
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.name.as_str())
        .collect();
    if !failed.is_empty() {
        logger.warn(&format!("Tasks without success: {}", failed.join(", ")));
    }
    logger.info("Run finished");
    Ok(())
}

/// Accepts `stop` on stdin and fires the cancel token; the front-end that
/// normally owns the token is out of scope for the headless shell.
fn spawn_stop_watcher(cancel: CancelToken, logger: Logger) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        while stdin.read_line(&mut line).is_ok_and(|n| n > 0) {
            if line.trim().eq_ignore_ascii_case("stop") {
                logger.info("Stop requested, finishing the current step...");
                cancel.cancel();
                break;
            }
            line.clear();
        }
    });
}
