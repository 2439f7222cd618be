//! Sequential task scheduler.
//!
//! Tasks drive one physical device, so execution is strictly one at a
//! time in ascending priority order on a dedicated worker thread.
//! Cancellation is cooperative: the shared token is checked before each
//! task and before each inter-task settle delay, and every perception
//! loop inside a task checks it per poll. Whatever path a run takes, the
//! channel is disconnected exactly once and exactly one `RunFinished`
//! event is emitted.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::task::{Task, TaskContext};

/// Settle time between consecutive tasks, letting the device UI come to
/// rest before the next workflow starts tapping.
const SETTLE_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    TaskFinished { name: String, success: bool },
    RunFinished,
}

#[derive(Clone, Debug)]
pub struct TaskReport {
    pub name: String,
    pub success: bool,
}

pub struct Scheduler {
    settle_delay: Duration,
    events: Option<Sender<SchedulerEvent>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            events: None,
        }
    }

    /// Emits `TaskFinished`/`RunFinished` events to `sender`; the excluded
    /// front-end consumes these.
    pub fn with_events(mut self, sender: Sender<SchedulerEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Runs the given tasks to completion on the calling thread.
    ///
    /// Connects the channel first; a connection failure aborts the run
    /// before any task executes (and without a disconnect, since nothing
    /// connected).
    pub fn run(&self, mut tasks: Vec<Box<dyn Task>>, ctx: &mut TaskContext) -> Vec<TaskReport> {
        let logger = ctx.logger.clone();

        if let Err(e) = ctx.channel.connect() {
            logger.error(&format!("Cannot reach the device, run aborted: {}", e));
            self.emit(SchedulerEvent::RunFinished);
            return Vec::new();
        }

        tasks.sort_by_key(|t| t.priority());

        let mut reports = Vec::new();
        let total = tasks.len();
        for (index, task) in tasks.iter_mut().enumerate() {
            if ctx.cancel.is_cancelled() {
                logger.info("Run cancelled, skipping remaining tasks");
                break;
            }

            logger.info(&format!(
                "Running task '{}' (priority {}): {}",
                task.name(),
                task.priority(),
                task.description()
            ));

            let success = match task.run(ctx) {
                Ok(ok) => ok,
                Err(e) => {
                    logger.error(&format!("Task '{}' failed: {}", task.name(), e));
                    false
                }
            };
            reports.push(TaskReport {
                name: task.name().to_string(),
                success,
            });
            self.emit(SchedulerEvent::TaskFinished {
                name: task.name().to_string(),
                success,
            });

            if index + 1 < total && !ctx.cancel.is_cancelled() {
                logger.info(&format!(
                    "Waiting {}s before the next task...",
                    self.settle_delay.as_secs()
                ));
                thread::sleep(self.settle_delay);
            }
        }

        ctx.channel.disconnect();
        self.emit(SchedulerEvent::RunFinished);
        reports
    }

    fn emit(&self, event: SchedulerEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}

/// Runs the scheduler on a dedicated worker thread, decoupled from the
/// caller. The caller keeps the cancel token (cloned into the context)
/// and the event receiver.
pub fn spawn_run(
    scheduler: Scheduler,
    tasks: Vec<Box<dyn Task>>,
    mut ctx: TaskContext,
) -> JoinHandle<Vec<TaskReport>> {
    thread::spawn(move || scheduler.run(tasks, &mut ctx))
}
