//! Deferred work owned by the root window
//!
//! Anything the root window wants to do "later" (draw, synthesize a mouse
//! move, expire a compositor lock, fire a long press) is queued here as
//! plain data. The host pumps the queue from its run loop with
//! `RootWindow::run_pending_tasks`. Tasks carry the id or token of the
//! thing they refer to, so a task whose subject has since gone away is
//! recognised and ignored when it runs.

use crate::window::WindowId;
use log::trace;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time for delayed tasks.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to; used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Run one draw cycle.
    Draw,
    /// Re-dispatch the last mouse location after the tree changed under it.
    SynthesizeMouseMove,
    /// Expire the compositor lock with this id if it is still held.
    CancelCompositorLock { lock_id: u64 },
    /// Fire a long press for the gesture sequence of `window` if it is
    /// still waiting on this token.
    LongPress { window: WindowId, token: u64 },
}

#[derive(Debug)]
struct PendingTask {
    due: Instant,
    seq: u64,
    task: Task,
}

/// Time-ordered queue of deferred tasks.
pub struct TaskQueue {
    clock: Rc<dyn Clock>,
    pending: Vec<PendingTask>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn post(&mut self, task: Task) {
        self.post_delayed(task, Duration::ZERO);
    }

    pub fn post_delayed(&mut self, task: Task, delay: Duration) {
        let due = self.clock.now() + delay;
        trace!("Posting {:?} due in {:?}", task, delay);
        self.pending.push(PendingTask {
            due,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Removes and returns every task that is due, oldest deadline first
    /// and in posting order among equal deadlines.
    pub(crate) fn take_due(&mut self) -> Vec<Task> {
        let now = self.clock.now();
        let (mut due, later): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|t| t.due <= now);
        self.pending = later;
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    /// Deadline of the earliest pending task.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|t| t.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, task: &Task) -> bool {
        self.pending.iter().any(|t| &t.task == task)
    }

    pub fn count(&self, task: &Task) -> usize {
        self.pending.iter().filter(|t| &t.task == task).count()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending)
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let clock = Rc::new(ManualClock::new());
        let mut queue = TaskQueue::new(clock.clone());
        queue.post_delayed(Task::CancelCompositorLock { lock_id: 1 }, Duration::from_millis(67));
        queue.post(Task::Draw);
        queue.post(Task::SynthesizeMouseMove);

        assert_eq!(queue.take_due(), vec![Task::Draw, Task::SynthesizeMouseMove]);
        assert_eq!(queue.len(), 1);
        assert!(queue.take_due().is_empty());

        clock.advance(Duration::from_millis(66));
        assert!(queue.take_due().is_empty());
        clock.advance(Duration::from_millis(1));
        assert_eq!(queue.take_due(), vec![Task::CancelCompositorLock { lock_id: 1 }]);
        assert!(queue.is_empty());
    }

    #[test]
    fn next_due_tracks_earliest_deadline() {
        let clock = Rc::new(ManualClock::new());
        let mut queue = TaskQueue::new(clock.clone());
        assert_eq!(queue.next_due(), None);
        queue.post_delayed(Task::Draw, Duration::from_millis(10));
        queue.post_delayed(Task::Draw, Duration::from_millis(5));
        assert_eq!(queue.next_due(), Some(clock.now() + Duration::from_millis(5)));
        assert_eq!(queue.count(&Task::Draw), 2);
    }
}
