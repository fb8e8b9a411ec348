//! Draw requests and compositor notifications

use super::RootWindow;
use crate::compositor::{acquire_lock, CompositorLock};

impl RootWindow {
    /// Runs a draw cycle now, or defers it behind the frame in flight or
    /// the compositor lock.
    pub fn draw(&mut self) {
        self.scheduler.borrow_mut().draw();
    }

    /// Posts a draw task unless one is already pending.
    pub fn schedule_draw(&mut self) {
        self.scheduler.borrow_mut().schedule_draw();
    }

    pub fn schedule_full_draw(&self) {
        self.scheduler.borrow().schedule_full_draw();
    }

    pub fn on_compositing_started(&mut self) {
        self.scheduler.borrow_mut().on_compositing_started();
    }

    pub fn on_compositing_ended(&mut self) {
        self.scheduler.borrow_mut().on_compositing_ended();
    }

    /// Holds back draws until the returned lock is dropped, cancelled or
    /// times out. Asking again while a lock is held returns the same lock.
    pub fn get_compositor_lock(&self) -> CompositorLock {
        acquire_lock(&self.scheduler)
    }

    pub fn is_compositor_locked(&self) -> bool {
        self.scheduler.borrow().is_locked()
    }

    pub fn draw_trace_count(&self) -> u64 {
        self.scheduler.borrow().draw_trace_count()
    }
}
