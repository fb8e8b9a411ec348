//! Draw scheduling against the compositor
//!
//! The root window never has more than one frame in flight. Requests that
//! arrive while a frame is compositing, or while a compositor lock is held,
//! are remembered and replayed later through the task queue so the event
//! loop is never flooded with draws.

use crate::geometry::Size;
use crate::task::{Task, TaskQueue};
use log::{debug, trace, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Frame submission interface implemented by the host's compositor.
pub trait Compositor {
    /// Submit a frame. Completion is reported back through
    /// `RootWindow::on_compositing_ended`.
    fn draw(&self, force_clear: bool);

    fn schedule_full_draw(&self);

    fn widget_size_changed(&self, size: Size);
}

/// Draw bookkeeping shared between the root window and its lock tokens.
pub struct DrawScheduler {
    compositor: Rc<dyn Compositor>,
    tasks: Rc<RefCell<TaskQueue>>,
    lock_timeout: Duration,

    waiting_on_compositing_end: bool,
    draw_on_compositing_end: bool,
    defer_draw_scheduling: bool,
    draw_on_compositor_unlock: bool,

    lock: Option<Weak<CompositorLockInner>>,
    lock_id: Option<u64>,
    next_lock_id: u64,

    draw_trace_count: u64,
}

impl DrawScheduler {
    pub fn new(compositor: Rc<dyn Compositor>, tasks: Rc<RefCell<TaskQueue>>, lock_timeout: Duration) -> Self {
        Self {
            compositor,
            tasks,
            lock_timeout,
            waiting_on_compositing_end: false,
            draw_on_compositing_end: false,
            defer_draw_scheduling: false,
            draw_on_compositor_unlock: false,
            lock: None,
            lock_id: None,
            next_lock_id: 0,
            draw_trace_count: 0,
        }
    }

    pub fn compositor(&self) -> &Rc<dyn Compositor> {
        &self.compositor
    }

    /// Submits a frame now unless one is in flight or the compositor is
    /// locked, in which case the draw is remembered for later.
    pub fn draw(&mut self) {
        if self.waiting_on_compositing_end {
            self.draw_on_compositing_end = true;
            self.defer_draw_scheduling = false;
            return;
        }
        if self.is_locked() {
            self.draw_on_compositor_unlock = true;
            self.defer_draw_scheduling = false;
            return;
        }
        self.waiting_on_compositing_end = true;

        debug!("Draw #{} begin", self.draw_trace_count);
        self.draw_trace_count += 1;

        self.compositor.draw(false);
        self.defer_draw_scheduling = false;
    }

    /// Posts at most one deferred draw until that draw runs.
    pub fn schedule_draw(&mut self) {
        if self.is_locked() {
            self.draw_on_compositor_unlock = true;
        } else if !self.defer_draw_scheduling {
            self.defer_draw_scheduling = true;
            self.tasks.borrow_mut().post(Task::Draw);
        }
    }

    pub fn schedule_full_draw(&self) {
        self.compositor.schedule_full_draw();
    }

    pub fn on_compositing_started(&mut self) {
        trace!("Compositing started for draw #{}", self.draw_trace_count);
    }

    /// A draw requested during compositing is scheduled rather than run, so
    /// other compositing observers see the end of this frame first.
    pub fn on_compositing_ended(&mut self) {
        debug!("Draw #{} end", self.draw_trace_count);
        self.waiting_on_compositing_end = false;
        if self.draw_on_compositing_end {
            self.draw_on_compositing_end = false;
            self.schedule_draw();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock_id.is_some()
    }

    pub fn is_waiting_on_compositing_end(&self) -> bool {
        self.waiting_on_compositing_end
    }

    pub fn is_draw_deferred(&self) -> bool {
        self.defer_draw_scheduling
    }

    pub fn draw_on_compositor_unlock(&self) -> bool {
        self.draw_on_compositor_unlock
    }

    /// Number of frames submitted so far.
    pub fn draw_trace_count(&self) -> u64 {
        self.draw_trace_count
    }

    fn unlock(&mut self, lock_id: u64) {
        if self.lock_id != Some(lock_id) {
            return;
        }
        debug!("Compositor lock {} released", lock_id);
        self.lock = None;
        self.lock_id = None;
        if self.draw_on_compositor_unlock {
            self.draw_on_compositor_unlock = false;
            self.schedule_draw();
        }
    }

    /// Forgets any pending unlock draw and drops the lock; used on teardown.
    pub(crate) fn abandon_lock(&mut self) {
        self.draw_on_compositor_unlock = false;
        self.lock = None;
        self.lock_id = None;
    }
}

impl fmt::Debug for DrawScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawScheduler")
            .field("waiting_on_compositing_end", &self.waiting_on_compositing_end)
            .field("draw_on_compositing_end", &self.draw_on_compositing_end)
            .field("defer_draw_scheduling", &self.defer_draw_scheduling)
            .field("draw_on_compositor_unlock", &self.draw_on_compositor_unlock)
            .field("lock_id", &self.lock_id)
            .field("draw_trace_count", &self.draw_trace_count)
            .finish()
    }
}

/// Returns the outstanding lock, or takes a new one that expires on its own
/// after the scheduler's lock timeout.
pub fn acquire_lock(scheduler: &Rc<RefCell<DrawScheduler>>) -> CompositorLock {
    let mut s = scheduler.borrow_mut();
    if let Some(existing) = s.lock.as_ref().and_then(Weak::upgrade) {
        return CompositorLock(existing);
    }

    s.next_lock_id += 1;
    let id = s.next_lock_id;
    let inner = Rc::new(CompositorLockInner {
        id,
        scheduler: Rc::downgrade(scheduler),
        cancelled: Cell::new(false),
    });
    s.lock = Some(Rc::downgrade(&inner));
    s.lock_id = Some(id);
    let timeout = s.lock_timeout;
    s.tasks
        .borrow_mut()
        .post_delayed(Task::CancelCompositorLock { lock_id: id }, timeout);
    debug!("Compositor lock {} acquired for at most {:?}", id, timeout);
    CompositorLock(inner)
}

/// Expires the lock with `lock_id` if it is still the outstanding one.
pub(crate) fn expire_lock(scheduler: &Rc<RefCell<DrawScheduler>>, lock_id: u64) {
    let lock = {
        let s = scheduler.borrow();
        if s.lock_id != Some(lock_id) {
            return;
        }
        s.lock.as_ref().and_then(Weak::upgrade)
    };
    match lock {
        Some(lock) => {
            debug!("Compositor lock {} timed out", lock_id);
            lock.cancel();
        }
        None => scheduler.borrow_mut().unlock(lock_id),
    }
}

struct CompositorLockInner {
    id: u64,
    scheduler: Weak<RefCell<DrawScheduler>>,
    cancelled: Cell<bool>,
}

impl CompositorLockInner {
    /// Stays active if the scheduler is busy; the timeout task retries.
    fn cancel(&self) {
        if self.cancelled.get() {
            return;
        }
        let Some(scheduler) = self.scheduler.upgrade() else {
            self.cancelled.set(true);
            return;
        };
        match scheduler.try_borrow_mut() {
            Ok(mut s) => {
                self.cancelled.set(true);
                s.unlock(self.id);
            }
            Err(_) => warn!("Compositor lock {} released while the scheduler was busy", self.id),
        };
    }
}

impl Drop for CompositorLockInner {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Shared token deferring draws while alive.
///
/// Clones refer to the same lock. The lock ends when the last clone is
/// dropped, when [`CompositorLock::cancel`] is called, or when its timeout
/// task runs, whichever happens first.
#[derive(Clone)]
pub struct CompositorLock(Rc<CompositorLockInner>);

impl CompositorLock {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.0.cancelled.get()
    }

    pub fn same_lock(&self, other: &CompositorLock) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CompositorLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorLock")
            .field("id", &self.0.id)
            .field("active", &self.is_active())
            .finish()
    }
}
