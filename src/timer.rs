use std::time::Duration;

use crate::scheduler::{RepeatingTask, Scheduler, TaskId};

/// Handle on the round's repeating tick. Only one ticker is ever live.
#[derive(Debug, Default)]
pub struct Timer {
    task: Option<TaskId>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop any running ticker, then run `tick` every `period`.
    pub fn start(&mut self, scheduler: &dyn Scheduler, period: Duration, tick: RepeatingTask) {
        self.stop(scheduler);
        self.task = Some(scheduler.schedule_repeating(period, tick));
    }

    /// Safe to call when nothing is running.
    pub fn stop(&mut self, scheduler: &dyn Scheduler) {
        if let Some(task) = self.task.take() {
            scheduler.cancel(task);
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}
