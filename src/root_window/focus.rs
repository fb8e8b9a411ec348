//! Capture, focus and cleanup when a window stops being reachable

use super::RootWindow;
use crate::event::{Event, EventFlags, EventType, MouseEvent};
use crate::geometry::Point;
use crate::window::WindowId;
use log::{debug, info};

impl RootWindow {
    // Capture

    pub fn capture_window(&self) -> Option<WindowId> {
        self.live(self.capture_window)
    }

    pub fn has_capture(&self, window: WindowId) -> bool {
        self.capture_window() == Some(window)
    }

    /// Routes all mouse and touch input to `window` until released or
    /// replaced. The previous holder is told it lost capture.
    pub fn set_capture(&mut self, window: WindowId) {
        if !self.tree.exists(window) {
            return;
        }
        self.set_capture_window(Some(window));
    }

    /// Releases capture if `window` holds it.
    pub fn release_capture(&mut self, window: WindowId) {
        if self.capture_window() == Some(window) {
            self.set_capture_window(None);
        }
    }

    fn set_capture_window(&mut self, window: Option<WindowId>) {
        let old = self.live(self.capture_window);
        if old == window {
            return;
        }
        self.capture_window = window;
        debug!("Capture {:?} -> {:?}", old, window);

        if let Some(old) = old {
            self.handle_mouse_capture_changed(old);
        }

        match window {
            Some(capture) => {
                if self.live(self.mouse_moved_handler).is_some() || !self.mouse_button_flags.buttons().is_empty() {
                    self.mouse_moved_handler = Some(capture);
                }
            }
            None => self.mouse_moved_handler = None,
        }
        self.mouse_pressed_handler = None;
    }

    /// Sends the old holder a capture-changed event, then `on_capture_lost`
    /// whether or not a filter swallowed the event.
    fn handle_mouse_capture_changed(&mut self, old: WindowId) {
        let Some(delegate) = self.tree.delegate(old) else {
            return;
        };
        let mut event = MouseEvent::at(EventType::MouseCaptureChanged, Point::default(), EventFlags::empty());
        self.process_mouse_event(old, &mut event);
        delegate.on_capture_lost();
    }

    // Focus

    pub fn focused_window(&self) -> Option<WindowId> {
        self.live(self.focused_window)
    }

    pub fn is_focused_window(&self, window: WindowId) -> bool {
        self.focused_window() == Some(window)
    }

    /// Moves focus to `window`, or clears it with `None`.
    ///
    /// Does nothing when the window is already focused, cannot take focus
    /// or the activation client vetoes the change.
    pub fn set_focused_window(&mut self, window: Option<WindowId>, event: Option<&Event>) {
        if let Some(w) = window {
            if !self.tree.exists(w) {
                return;
            }
        }
        let old = self.live(self.focused_window);
        if window == old {
            return;
        }
        if let Some(w) = window {
            if !self.can_focus(w) {
                debug!("Window {:?} cannot take focus", w);
                return;
            }
            if let Some(client) = &self.activation_client {
                if !client.on_will_focus_window(&self.tree, w, event) {
                    debug!("Focus change to {:?} vetoed", w);
                    return;
                }
            }
        }

        self.focused_window = window;
        if let Some(delegate) = old.and_then(|o| self.tree.delegate(o)) {
            delegate.on_blur();
        }
        if let Some(w) = window {
            if let Some(delegate) = self.tree.delegate(w) {
                delegate.on_focus();
            }
            info!("🎯 Focus moved to {:?}", w);
            self.notify_root_observers(|o| o.on_window_focused(w));
        }
    }

    /// Visible, and every window up to the root is willing to take focus
    /// and allowed to receive events.
    pub fn can_focus(&self, window: WindowId) -> bool {
        if window == self.root {
            return self.tree.is_visible(window);
        }
        let Some(parent) = self.tree.parent(window) else {
            return false;
        };
        if !self.tree.is_visible(window) {
            return false;
        }
        if let Some(delegate) = self.tree.delegate(window) {
            if !delegate.can_focus() {
                return false;
            }
        }
        if !self.event_client_allows(window) {
            return false;
        }
        self.can_focus(parent)
    }

    pub fn can_receive_events(&self, window: WindowId) -> bool {
        if window == self.root {
            return self.tree.is_visible(window);
        }
        if !self.event_client_allows(window) {
            return false;
        }
        let Some(parent) = self.tree.parent(window) else {
            return false;
        };
        self.tree.is_visible(window) && self.can_receive_events(parent)
    }

    fn event_client_allows(&self, window: WindowId) -> bool {
        self.event_client
            .as_ref()
            .map_or(true, |c| c.can_process_events_within_subtree(&self.tree, window))
    }

    fn activation_allows(&self, window: WindowId) -> bool {
        self.activation_client
            .as_ref()
            .map_or(true, |c| c.on_will_focus_window(&self.tree, window, None))
    }

    /// Clears every reference dispatch holds into the subtree of
    /// `invisible`, which is being hidden, detached or destroyed.
    ///
    /// Focus inside the subtree moves to a transient relative or the
    /// parent when that window is visible and accepted by the activation
    /// client, and otherwise becomes none.
    pub(super) fn on_window_hidden(&mut self, invisible: WindowId, destroyed: bool) {
        let focused = self.live(self.focused_window);
        if self.tree.contains(invisible, focused) {
            let candidate = self.focus_candidate(invisible, destroyed);
            let candidate = candidate.filter(|&c| self.tree.is_visible(c) && self.activation_allows(c));
            debug!("Focus was inside hidden {:?}, moving to {:?}", invisible, candidate);
            self.set_focused_window(candidate, None);
            // A vetoed replacement still must not leave focus in the subtree.
            if self.tree.contains(invisible, self.live(self.focused_window)) {
                let old = self.focused_window.take();
                if let Some(delegate) = old.and_then(|o| self.tree.delegate(o)) {
                    delegate.on_blur();
                }
            }
        }

        let capture = self.live(self.capture_window);
        if invisible != self.root && self.tree.contains(invisible, capture) {
            self.set_capture_window(None);
        }

        if self.tree.contains(invisible, self.live(self.mouse_pressed_handler)) {
            self.mouse_pressed_handler = None;
        }
        if self.tree.contains(invisible, self.live(self.mouse_moved_handler)) {
            self.mouse_moved_handler = None;
        }

        for window in self.tree.descendants(invisible) {
            self.gesture_recognizer.flush_touch_queue(window);
        }
    }

    fn focus_candidate(&mut self, invisible: WindowId, destroyed: bool) -> Option<WindowId> {
        let window = self.tree.get(invisible)?;
        let transient_parent = window.transient_parent();
        let parent = window.parent();

        if let Some(tp) = transient_parent.filter(|&tp| self.tree.exists(tp)) {
            if destroyed {
                let _ = self.tree.remove_transient_child(tp, invisible);
            }
            return Some(tp);
        }

        if !destroyed {
            let transient_child = window
                .transient_children()
                .iter()
                .rev()
                .copied()
                .find(|&c| self.tree.is_visible(c) && !self.tree.contains(invisible, Some(c)));
            if transient_child.is_some() {
                return transient_child;
            }
        }

        parent
    }
}
