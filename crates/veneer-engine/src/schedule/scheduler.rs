use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use super::{TaskQueue, TaskSpawner};

/// Repaint request handle given to the UI engine.
///
/// All clones share one pending flag; any number of invalidations before the
/// next tick collapse into a single render.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    pending: Rc<Cell<bool>>,
}

impl Invalidator {
    #[inline]
    pub fn invalidate(&self) {
        self.pending.set(true);
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// Coalesces repaint requests into at most one render per tick and owns the
/// UI task queue.
#[derive(Default)]
pub struct FrameScheduler {
    repaint: Invalidator,
    tasks: TaskQueue,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidator(&self) -> Invalidator {
        self.repaint.clone()
    }

    pub fn spawner(&self) -> TaskSpawner {
        self.tasks.spawner()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.repaint.is_pending()
    }

    /// Clears the pending flag, returning whether a render is due.
    #[inline]
    pub fn take_pending(&self) -> bool {
        self.repaint.pending.replace(false)
    }

    /// Runs ready UI tasks and returns when the queue next needs to run.
    pub fn drain_tasks(&self, now: Instant) -> Option<Instant> {
        let ran = self.tasks.run_ready(now);
        if ran > 0 {
            log::trace!("ran {ran} ui task(s)");
        }
        self.tasks.next_wakeup(now)
    }

    /// When the task queue next needs to run, without running anything.
    pub fn next_task_deadline(&self, now: Instant) -> Option<Instant> {
        self.tasks.next_wakeup(now)
    }

    /// Starts a scheduling tick: drains ready tasks, then clears the pending
    /// flag. Returns whether the caller must render once.
    ///
    /// The flag is cleared before the render runs, so an invalidation raised
    /// during that render schedules exactly one more.
    pub fn begin_frame(&self, now: Instant) -> bool {
        self.drain_tasks(now);
        self.take_pending()
    }

    /// Drops pending repaints and queued tasks.
    pub fn discard(&self) {
        self.repaint.pending.set(false);
        self.tasks.clear();
    }
}
