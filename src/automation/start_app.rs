//! App restart task.
//!
//! Force-stops and relaunches the homework app so every run starts from
//! the main screen, then confirms within a bounded window that the app
//! actually took window focus.

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};

use super::task::{Task, TaskContext};

pub struct StartAppTask {
    pub package: String,
    pub activity: String,
    /// Settle after force-stop before relaunching.
    pub post_stop_delay: Duration,
    /// Deadline for the app to take window focus.
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
}

impl StartAppTask {
    pub fn new() -> Self {
        Self {
            package: "com.ets100.secondary".to_string(),
            activity: ".ui.main.MainActivity".to_string(),
            post_stop_delay: Duration::from_secs(2),
            startup_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl Default for StartAppTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for StartAppTask {
    fn name(&self) -> &str {
        "start app"
    }

    fn description(&self) -> &str {
        "Force-stops and relaunches the homework app"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn run(&mut self, ctx: &mut TaskContext) -> Result<bool> {
        ctx.logger.info("Stopping the app...");
        ctx.channel
            .shell(&format!("am force-stop {}", self.package))?;
        thread::sleep(self.post_stop_delay);
        if ctx.cancel.is_cancelled() {
            return Ok(false);
        }

        ctx.logger.info("Starting the app...");
        ctx.channel
            .shell(&format!("am start {}/{}", self.package, self.activity))?;

        let deadline = Instant::now() + self.startup_timeout;
        loop {
            if ctx.cancel.is_cancelled() {
                return Ok(false);
            }

            let focus = ctx
                .channel
                .shell("dumpsys window | grep mCurrentFocus")?;
            if focus.contains(&self.package) {
                ctx.logger.info("App started and took focus");
                return Ok(true);
            }

            if Instant::now() >= deadline {
                ctx.logger.error("App start timed out");
                return Ok(false);
            }
            thread::sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::task::testing::context;
    use crate::device::testing::FakeChannel;
    use tempfile::tempdir;

    fn fast_task() -> StartAppTask {
        let mut task = StartAppTask::new();
        task.post_stop_delay = Duration::from_millis(1);
        task.startup_timeout = Duration::from_millis(20);
        task.poll_interval = Duration::from_millis(1);
        task
    }

    #[test]
    fn test_succeeds_when_app_takes_focus() {
        let dir = tempdir().unwrap();
        let channel = FakeChannel::new();
        channel
            .set_shell_response("mCurrentFocus=Window{abc u0 com.ets100.secondary/.ui.main.MainActivity}");
        let probe = channel.probe();
        let mut ctx = context(Box::new(channel), dir.path());

        let result = fast_task().run(&mut ctx).unwrap();
        assert!(result);

        let log = probe.lock().unwrap().shell_log.clone();
        assert_eq!(log[0], "am force-stop com.ets100.secondary");
        assert_eq!(log[1], "am start com.ets100.secondary/.ui.main.MainActivity");
        assert!(log[2].contains("dumpsys window"));
    }

    #[test]
    fn test_fails_when_focus_never_arrives() {
        let dir = tempdir().unwrap();
        let channel = FakeChannel::new();
        channel.set_shell_response("mCurrentFocus=Window{abc u0 com.other.app/Main}");
        let mut ctx = context(Box::new(channel), dir.path());

        let result = fast_task().run(&mut ctx).unwrap();
        assert!(!result);
    }

    #[test]
    fn test_cancel_short_circuits() {
        let dir = tempdir().unwrap();
        let channel = FakeChannel::new();
        let probe = channel.probe();
        let mut ctx = context(Box::new(channel), dir.path());
        ctx.cancel.cancel();

        let result = fast_task().run(&mut ctx).unwrap();
        assert!(!result);
        // Only the force-stop went out before the token was observed.
        assert_eq!(probe.lock().unwrap().shell_log.len(), 1);
    }
}
