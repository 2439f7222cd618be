//! Timestamped logging to console and a per-run log file.
//!
//! `Logger` is a cheap clonable handle constructed once by the embedding
//! shell and passed to every component that needs it. There is no global
//! logger instance.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Logger {
    file: Arc<Mutex<Option<File>>>,
}

impl Logger {
    /// Creates a logger writing to stdout and a fresh timestamped file
    /// under `log_dir` (e.g. `app_20250101_120000.log`).
    ///
    /// If the file cannot be opened, logging degrades to console only.
    pub fn new(log_dir: &Path) -> Self {
        let filename = format!("app_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(filename))
            .ok();
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    /// Console-only logger for tests and tooling.
    pub fn disabled() -> Self {
        Self {
            file: Arc::new(Mutex::new(None)),
        }
    }

    pub fn info(&self, msg: &str) {
        self.write("INFO", msg);
    }

    pub fn warn(&self, msg: &str) {
        self.write("WARNING", msg);
    }

    pub fn error(&self, msg: &str) {
        self.write("ERROR", msg);
    }

    fn write(&self, level: &str, msg: &str) {
        let line = format!(
            "{} - {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            msg
        );
        print!("{}", line);
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }
}
