//! Explicit task registry.
//!
//! Maps stable task identifiers to constructors in a startup-time list;
//! the scheduler still sees an unordered set and sorts by priority.
//! Unknown identifiers are silently skipped so a stale selection (e.g.
//! from a saved front-end state) degrades instead of failing the run.

use super::homework::HomeworkTask;
use super::start_app::StartAppTask;
use super::task::Task;

type TaskConstructor = fn() -> Box<dyn Task>;

pub struct TaskRegistry {
    entries: Vec<(&'static str, TaskConstructor)>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The registry with every shipped task.
    pub fn with_builtin_tasks() -> Self {
        let mut registry = Self::new();
        registry.register("start_app", || Box::new(StartAppTask::new()));
        registry.register("homework", || Box::new(HomeworkTask::new()));
        registry
    }

    pub fn register(&mut self, id: &'static str, constructor: TaskConstructor) {
        self.entries.push((id, constructor));
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Builds one task by identifier.
    pub fn build(&self, id: &str) -> Option<Box<dyn Task>> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, constructor)| constructor())
    }

    /// Builds the named tasks, silently excluding identifiers that are not
    /// registered.
    pub fn instantiate(&self, ids: &[&str]) -> Vec<Box<dyn Task>> {
        ids.iter().filter_map(|id| self.build(id)).collect()
    }
}
