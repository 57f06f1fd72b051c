use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce()>;

struct TimedTask {
    due: Instant,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Queue {
    immediate: VecDeque<Task>,
    timed: Vec<TimedTask>,
    seq: u64,
}

/// Queue of deferred UI work.
///
/// Tasks run on the owning thread when [`run_ready`](Self::run_ready) is
/// called. A task spawned while the queue is running waits for the next call,
/// so a task that keeps rescheduling itself cannot starve rendering.
#[derive(Default)]
pub struct TaskQueue {
    inner: Rc<RefCell<Queue>>,
}

/// Cloneable handle for adding tasks to a [`TaskQueue`].
#[derive(Clone)]
pub struct TaskSpawner {
    inner: Rc<RefCell<Queue>>,
}

impl TaskSpawner {
    /// Queues `task` to run on the next drain.
    pub fn spawn(&self, task: impl FnOnce() + 'static) {
        self.inner.borrow_mut().immediate.push_back(Box::new(task));
    }

    /// Queues `task` to run on the first drain at or after `due`.
    pub fn spawn_at(&self, due: Instant, task: impl FnOnce() + 'static) {
        let mut queue = self.inner.borrow_mut();
        queue.seq += 1;
        let seq = queue.seq;
        queue.timed.push(TimedTask {
            due,
            seq,
            task: Box::new(task),
        });
    }

    pub fn spawn_after(&self, delay: Duration, task: impl FnOnce() + 'static) {
        self.spawn_at(Instant::now() + delay, task);
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawner(&self) -> TaskSpawner {
        TaskSpawner {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Runs immediate tasks, then timed tasks due at `now` in deadline order.
    ///
    /// Returns the number of tasks run.
    pub fn run_ready(&self, now: Instant) -> usize {
        let ready = {
            let mut queue = self.inner.borrow_mut();
            let mut ready: Vec<Task> = queue.immediate.drain(..).collect();

            let (mut due, later): (Vec<_>, Vec<_>) =
                queue.timed.drain(..).partition(|t| t.due <= now);
            queue.timed = later;
            due.sort_by_key(|t| (t.due, t.seq));
            ready.extend(due.into_iter().map(|t| t.task));
            ready
        };

        let count = ready.len();
        for task in ready {
            task();
        }
        count
    }

    /// When the queue next needs to run: `now` if immediate work is waiting,
    /// else the earliest deadline.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let queue = self.inner.borrow();
        if !queue.immediate.is_empty() {
            return Some(now);
        }
        queue.timed.iter().map(|t| t.due).min()
    }

    /// Drops every queued task without running it.
    pub fn clear(&self) {
        let mut queue = self.inner.borrow_mut();
        queue.immediate.clear();
        queue.timed.clear();
    }

    pub fn len(&self) -> usize {
        let queue = self.inner.borrow();
        queue.immediate.len() + queue.timed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| -> Box<dyn FnOnce()> {
            let sink = Rc::clone(&sink);
            Box::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn immediate_tasks_run_in_order() {
        let queue = TaskQueue::new();
        let spawner = queue.spawner();
        let (log, task) = recorder();
        spawner.spawn(task("a"));
        spawner.spawn(task("b"));

        assert_eq!(queue.run_ready(Instant::now()), 2);
        assert_eq!(*log.borrow(), ["a", "b"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn timed_tasks_wait_for_their_deadline() {
        let queue = TaskQueue::new();
        let spawner = queue.spawner();
        let (log, task) = recorder();
        let t0 = Instant::now();
        spawner.spawn_at(t0 + Duration::from_millis(20), task("late"));
        spawner.spawn_at(t0 + Duration::from_millis(10), task("early"));

        assert_eq!(queue.run_ready(t0), 0);
        assert_eq!(queue.next_wakeup(t0), Some(t0 + Duration::from_millis(10)));

        assert_eq!(queue.run_ready(t0 + Duration::from_millis(30)), 2);
        assert_eq!(*log.borrow(), ["early", "late"]);
        assert_eq!(queue.next_wakeup(t0), None);
    }

    #[test]
    fn tasks_spawned_while_running_wait_for_next_drain() {
        let queue = TaskQueue::new();
        let spawner = queue.spawner();
        let (log, task) = recorder();
        let inner = spawner.clone();
        let second = task("second");
        let first = task("first");
        spawner.spawn(move || {
            first();
            inner.spawn(second);
        });

        let now = Instant::now();
        assert_eq!(queue.run_ready(now), 1);
        assert_eq!(queue.next_wakeup(now), Some(now));
        assert_eq!(queue.run_ready(now), 1);
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn clear_drops_everything() {
        let queue = TaskQueue::new();
        let spawner = queue.spawner();
        let (log, task) = recorder();
        spawner.spawn(task("x"));
        spawner.spawn_after(Duration::from_secs(60), task("y"));
        assert_eq!(queue.len(), 2);

        queue.clear();
        assert_eq!(queue.run_ready(Instant::now() + Duration::from_secs(120)), 0);
        assert!(log.borrow().is_empty());
    }
}
