//! Creating, reparenting, showing, moving and destroying windows
//!
//! These wrap the raw tree operations so that dispatch state (focus,
//! capture, handlers, gesture queues, the synthesized mouse move) follows
//! every structural change.

use super::RootWindow;
use crate::client::LayerVisibility;
use crate::delegate::WindowDelegate;
use crate::geometry::{Rect, Transform};
use crate::window::{WindowError, WindowId};
use log::{debug, trace};
use std::rc::Rc;

impl RootWindow {
    /// Creates a detached window.
    pub fn create_window(&mut self, delegate: Option<Rc<dyn WindowDelegate>>) -> WindowId {
        let window = self.tree.create(delegate);
        self.env.notify_window_initialized(window);
        trace!("Created window {:?}", window);
        window
    }

    /// Appends `child` on top of `parent`'s children, removing it from its
    /// current parent first.
    pub fn add_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        if !self.tree.exists(parent) {
            return Err(WindowError::NotFound(parent));
        }
        if !self.tree.exists(child) {
            return Err(WindowError::NotFound(child));
        }
        if self.tree.contains(child, Some(parent)) {
            return Err(WindowError::Cycle { parent, child });
        }
        if let Some(old_parent) = self.tree.parent(child) {
            self.remove_child(old_parent, child)?;
        }
        self.tree.attach(parent, child)?;

        if self.is_in_root(child) {
            if self.contains_mouse(child) {
                self.post_mouse_move_event_after_window_change();
            }
            for window in self.tree.descendants(child) {
                self.tree.notify_observers(window, |o| o.on_window_added_to_root_window(window));
            }
        }
        Ok(())
    }

    /// Detaches `child` from `parent`, clearing any dispatch state that
    /// pointed into it.
    pub fn remove_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.tree.check_child(parent, child)?;
        self.tree.notify_observers(parent, |o| o.on_will_remove_window(child));

        if self.is_in_root(child) {
            self.on_window_hidden(child, false);
            if self.contains_mouse(child) {
                self.post_mouse_move_event_after_window_change();
            }
            for window in self.tree.descendants(child) {
                self.tree
                    .notify_observers(window, |o| o.on_window_removing_from_root_window(window));
            }
        }
        self.tree.detach(parent, child)
    }

    /// Destroys `window` and its whole subtree.
    ///
    /// Delegates and observers see `destroying` parent first and
    /// `destroyed` child first; the window is detached from its parent
    /// before its own `destroyed` fires.
    pub fn destroy_window(&mut self, window: WindowId) -> Result<(), WindowError> {
        if window == self.root {
            return Err(WindowError::IsRoot(window));
        }
        if !self.tree.exists(window) {
            return Err(WindowError::NotFound(window));
        }
        debug!("Destroying window {:?}", window);

        let delegate = self.tree.delegate(window);
        if let Some(delegate) = &delegate {
            delegate.on_window_destroying();
        }
        self.tree.notify_observers(window, |o| o.on_window_destroying(window));

        if self.is_in_root(window) {
            self.on_window_hidden(window, true);
            if self.contains_mouse(window) {
                self.post_mouse_move_event_after_window_change();
            }
        }

        loop {
            let Some(child) = self.tree.get(window).and_then(|w| w.children().first().copied()) else {
                break;
            };
            self.destroy_window(child)?;
        }

        if let Some(tp) = self.tree.get(window).and_then(|w| w.transient_parent()) {
            let _ = self.tree.remove_transient_child(tp, window);
        }

        if let Some(parent) = self.tree.parent(window) {
            self.remove_child(parent, window)?;
        }

        if let Some(delegate) = &delegate {
            delegate.on_window_destroyed();
        }

        let transients = self
            .tree
            .get(window)
            .map(|w| w.transient_children().to_vec())
            .unwrap_or_default();
        for transient in transients {
            if self.tree.exists(transient) {
                let _ = self.tree.remove_transient_child(window, transient);
                self.destroy_window(transient)?;
            }
        }

        self.tree.notify_observers(window, |o| o.on_window_destroyed(window));
        self.tree.remove(window);
        Ok(())
    }

    // Visibility

    pub fn show(&mut self, window: WindowId) -> Result<(), WindowError> {
        self.set_visible(window, true)
    }

    /// Hides `window`; focus, capture and handlers inside it are cleared.
    pub fn hide(&mut self, window: WindowId) -> Result<(), WindowError> {
        self.set_visible(window, false)
    }

    pub fn set_visible(&mut self, window: WindowId, visible: bool) -> Result<(), WindowError> {
        let target_visibility = self
            .tree
            .get(window)
            .map(|w| w.target_visibility())
            .ok_or(WindowError::NotFound(window))?;
        if target_visibility == visible {
            return Ok(());
        }

        let was_visible = self.tree.is_visible(window);
        let in_root = self.is_in_root(window);

        match self.visibility_client.clone().filter(|_| in_root) {
            Some(client) => match client.update_layer_visibility(&self.tree, window, visible) {
                LayerVisibility::Immediate => self.tree.set_layer_visible_raw(window, visible)?,
                LayerVisibility::Deferred => {}
                LayerVisibility::Abandoned => self.tree.set_closing(window, true)?,
            },
            None => self.tree.set_layer_visible_raw(window, visible)?,
        }
        self.tree.set_visible_raw(window, visible)?;

        let now_visible = self.tree.is_visible(window);
        if was_visible != now_visible {
            if now_visible {
                self.schedule_full_paint(window);
            }
            if let Some(delegate) = self.tree.delegate(window) {
                delegate.on_window_visibility_changed(now_visible);
            }
        }

        if in_root && self.tree.parent(window).is_some() {
            if !visible {
                self.on_window_hidden(window, false);
            }
            if self.tree.contains_point_in_root(window, self.last_mouse_location) {
                self.post_mouse_move_event_after_window_change();
            }
        }

        self.tree.notify_observers(window, |o| o.on_window_visibility_changed(window, visible));
        Ok(())
    }

    /// Applies a layer visibility change a visibility client deferred.
    pub fn set_layer_visibility(&mut self, window: WindowId, visible: bool) -> Result<(), WindowError> {
        self.tree.set_layer_visible_raw(window, visible)?;
        if visible {
            self.schedule_full_paint(window);
        }
        Ok(())
    }

    fn schedule_full_paint(&mut self, window: WindowId) {
        let size = self.tree.get(window).map(|w| w.bounds().size()).unwrap_or_default();
        self.schedule_paint(window, Rect::from_size(size));
    }

    pub fn set_closing(&mut self, window: WindowId, closing: bool) -> Result<(), WindowError> {
        self.tree.set_closing(window, closing)
    }

    // Geometry

    pub fn set_bounds(&mut self, window: WindowId, bounds: Rect) -> Result<(), WindowError> {
        if !self.tree.exists(window) {
            return Err(WindowError::NotFound(window));
        }
        self.set_bounds_internal(window, bounds);
        Ok(())
    }

    pub(super) fn set_bounds_internal(&mut self, window: WindowId, bounds: Rect) {
        let Some(w) = self.tree.get(window) else {
            return;
        };
        let old_bounds = w.bounds();
        let delegate = w.delegate().cloned();

        let mut bounds = bounds;
        if let Some(delegate) = &delegate {
            let min = delegate.minimum_size();
            bounds.width = bounds.width.max(min.width);
            bounds.height = bounds.height.max(min.height);
        }
        if bounds == old_bounds {
            return;
        }

        let in_root = self.is_in_root(window);
        let contained_mouse = in_root && self.contains_mouse(window);

        if self.tree.set_bounds_raw(window, bounds).is_err() {
            return;
        }
        trace!("Bounds of {:?} {} -> {}", window, old_bounds, bounds);

        if let Some(delegate) = &delegate {
            delegate.on_bounds_changed(old_bounds, bounds);
        }
        self.tree.notify_observers(window, |o| o.on_window_bounds_changed(window, bounds));

        if in_root && (contained_mouse || self.contains_mouse(window)) {
            self.post_mouse_move_event_after_window_change();
        }
    }

    /// Sets a window's transform; for the root this re-lays out the host.
    pub fn set_transform(&mut self, window: WindowId, transform: Transform) -> Result<(), WindowError> {
        if window == self.root {
            self.set_root_transform(transform);
            return Ok(());
        }
        let in_root = self.is_in_root(window);
        let contained_mouse = in_root && self.contains_mouse(window);
        self.tree.set_transform_raw(window, transform)?;
        if in_root && (contained_mouse || self.contains_mouse(window)) {
            self.post_mouse_move_event_after_window_change();
        }
        Ok(())
    }

    /// Requests a repaint of `region` (in `window`'s coordinates).
    pub fn schedule_paint(&mut self, window: WindowId, region: Rect) {
        if window == self.root || !self.is_in_root(window) || !self.tree.is_visible(window) {
            return;
        }
        self.tree.notify_observers(window, |o| o.on_window_paint_scheduled(window, region));
        self.scheduler.borrow_mut().schedule_draw();
    }

    // Transients

    pub fn add_transient_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.tree.add_transient_child(parent, child)
    }

    pub fn remove_transient_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.tree.remove_transient_child(parent, child)
    }
}
