//! Deferred callbacks on the game's thread.
//!
//! The controller never sleeps; it hands closures to a [`Scheduler`] and
//! guards them with the round generation when they run.

use std::cell::RefCell;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Returned by repeating tasks to keep or drop themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Break,
}

pub type OnceTask = Box<dyn FnOnce()>;
pub type RepeatingTask = Box<dyn FnMut() -> ControlFlow>;

pub trait Scheduler {
    /// Run `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskId;

    /// Run `task` every `period` until it returns `Break` or is cancelled.
    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> TaskId;

    /// Drop a pending task. Returns `false` if it already ran out or is unknown.
    fn cancel(&self, id: TaskId) -> bool;
}

enum Job {
    Once(OnceTask),
    Repeating { period: Duration, task: RepeatingTask },
}

struct Entry {
    id: TaskId,
    due: Duration,
    job: Job,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
    running: Option<TaskId>,
    running_cancelled: bool,
}

/// A virtual clock. Nothing runs until [`ManualScheduler::advance`] is called.
#[derive(Default)]
pub struct ManualScheduler {
    inner: RefCell<ManualInner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    fn push(&self, delay: Duration, job: Job) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TaskId(inner.next_id);
        let due = inner.now + delay;
        inner.entries.push(Entry { id, due, job });
        id
    }

    fn pop_due(&self, deadline: Duration) -> Option<Entry> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= deadline)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(idx, _)| idx)?;
        let entry = inner.entries.swap_remove(idx);
        inner.now = entry.due;
        inner.running = Some(entry.id);
        inner.running_cancelled = false;
        Some(entry)
    }

    /// Move the clock forward by `by`, running every task that falls due in
    /// order of due time. Tasks may schedule or cancel other tasks.
    pub fn advance(&self, by: Duration) {
        let deadline = self.now() + by;
        while let Some(entry) = self.pop_due(deadline) {
            let Entry { id, due, job } = entry;
            let requeue = match job {
                Job::Once(task) => {
                    task();
                    None
                }
                Job::Repeating { period, mut task } => match task() {
                    ControlFlow::Continue => Some(Job::Repeating { period, task }),
                    ControlFlow::Break => None,
                },
            };

            let mut inner = self.inner.borrow_mut();
            let cancelled = inner.running_cancelled;
            inner.running = None;
            inner.running_cancelled = false;
            if let Some(job) = requeue
                && !cancelled
            {
                let period = match &job {
                    Job::Repeating { period, .. } => *period,
                    Job::Once(_) => Duration::ZERO,
                };
                // A zero period would spin forever inside one advance.
                let next_due = due + period.max(Duration::from_millis(1));
                inner.entries.push(Entry {
                    id,
                    due: next_due,
                    job,
                });
            }
        }
        self.inner.borrow_mut().now = deadline;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskId {
        self.push(delay, Job::Once(task))
    }

    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> TaskId {
        self.push(period, Job::Repeating { period, task })
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if let Some(idx) = inner.entries.iter().position(|entry| entry.id == id) {
            inner.entries.swap_remove(idx);
            return true;
        }
        if inner.running == Some(id) && !inner.running_cancelled {
            inner.running_cancelled = true;
            return true;
        }
        false
    }
}

#[cfg(feature = "glib")]
pub use self::glib_backend::GlibScheduler;

#[cfg(feature = "glib")]
mod glib_backend {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    use super::{ControlFlow, OnceTask, RepeatingTask, Scheduler, TaskId};

    /// Schedules on the thread-default glib main context.
    #[derive(Default)]
    pub struct GlibScheduler {
        next_id: Cell<u64>,
        sources: Rc<RefCell<HashMap<TaskId, glib::SourceId>>>,
    }

    impl GlibScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        fn next_id(&self) -> TaskId {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            TaskId(id)
        }
    }

    impl Scheduler for GlibScheduler {
        fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskId {
            let id = self.next_id();
            let sources = Rc::clone(&self.sources);
            let source = glib::timeout_add_local_once(delay, move || {
                sources.borrow_mut().remove(&id);
                task();
            });
            self.sources.borrow_mut().insert(id, source);
            id
        }

        fn schedule_repeating(&self, period: Duration, mut task: RepeatingTask) -> TaskId {
            let id = self.next_id();
            let sources = Rc::clone(&self.sources);
            let source = glib::timeout_add_local(period, move || match task() {
                ControlFlow::Continue => glib::ControlFlow::Continue,
                ControlFlow::Break => {
                    sources.borrow_mut().remove(&id);
                    glib::ControlFlow::Break
                }
            });
            self.sources.borrow_mut().insert(id, source);
            id
        }

        fn cancel(&self, id: TaskId) -> bool {
            let source = self.sources.borrow_mut().remove(&id);
            match source {
                Some(source) => {
                    source.remove();
                    true
                }
                None => false,
            }
        }
    }
}
