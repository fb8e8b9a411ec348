//! Capability traits implemented by window owners
//!
//! A window's delegate decides what happens to the events routed to it. Every
//! method has a do-nothing default so a delegate only spells out the
//! capabilities it actually cares about: a content window handles mouse and
//! key events, a touch surface only overrides the touch and gesture hooks.

use crate::event::{GestureEvent, GestureStatus, HitTestCode, KeyEvent, MouseEvent, TouchEvent, TouchStatus};
use crate::geometry::{Point, Rect, Size};
use crate::window::WindowId;

/// Handles events and lifecycle callbacks for a single window.
///
/// Delegates are shared (`Rc`) rather than owned by the window; state that
/// changes in response to events lives behind interior mutability.
pub trait WindowDelegate {
    /// Bounds requested for the window are clamped to at least this size.
    fn minimum_size(&self) -> Size {
        Size::default()
    }

    fn on_bounds_changed(&self, _old_bounds: Rect, _new_bounds: Rect) {}

    /// Which part of the window frame `point` (window coordinates) lies on.
    fn non_client_component(&self, _point: Point) -> HitTestCode {
        HitTestCode::Client
    }

    fn on_key_event(&self, _event: &KeyEvent) -> bool {
        false
    }

    fn on_mouse_event(&self, _event: &MouseEvent) -> bool {
        false
    }

    fn on_touch_event(&self, _event: &TouchEvent) -> TouchStatus {
        TouchStatus::Unknown
    }

    fn on_gesture_event(&self, _event: &GestureEvent) -> GestureStatus {
        GestureStatus::Unknown
    }

    fn can_focus(&self) -> bool {
        true
    }

    /// Called whenever the window loses capture, regardless of whether the
    /// capture-changed mouse event was consumed by a filter.
    fn on_capture_lost(&self) {}

    fn on_focus(&self) {}

    fn on_blur(&self) {}

    fn on_window_visibility_changed(&self, _visible: bool) {}

    fn on_window_destroying(&self) {}

    /// The window has been detached from its parent and its children are gone.
    fn on_window_destroyed(&self) {}
}

/// Observes structural and state changes of a single window.
pub trait WindowObserver {
    fn on_window_added(&self, _new_window: WindowId) {}

    fn on_will_remove_window(&self, _window: WindowId) {}

    fn on_window_parent_changed(&self, _window: WindowId, _parent: Option<WindowId>) {}

    fn on_window_visibility_changed(&self, _window: WindowId, _visible: bool) {}

    fn on_window_bounds_changed(&self, _window: WindowId, _new_bounds: Rect) {}

    fn on_window_stacking_changed(&self, _window: WindowId) {}

    fn on_window_property_changed(&self, _window: WindowId, _name: &'static str) {}

    fn on_window_added_to_root_window(&self, _window: WindowId) {}

    fn on_window_removing_from_root_window(&self, _window: WindowId) {}

    fn on_window_paint_scheduled(&self, _window: WindowId, _region: Rect) {}

    fn on_window_destroying(&self, _window: WindowId) {}

    fn on_window_destroyed(&self, _window: WindowId) {}
}

/// Observes the root window as a whole.
pub trait RootWindowObserver {
    /// Only fired when focus moves to a window, never when it is cleared.
    fn on_window_focused(&self, _window: WindowId) {}

    fn on_root_window_resized(&self, _old_size: Size) {}
}
