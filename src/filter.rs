//! Event filters attached to ancestor windows
//!
//! Each window may own at most one filter. Before an event reaches its
//! target's delegate, the filters of the target's ancestors get a chance to
//! consume it, outermost ancestor first.

use crate::event::{GestureEvent, GestureStatus, KeyEvent, MouseEvent, TouchEvent, TouchStatus};
use crate::window::{WindowId, WindowTree};

/// Intercepts events bound for windows in the owning window's subtree.
///
/// Returning `true` (or a non-`Unknown` status) consumes the event: no
/// further filter and no delegate sees it.
pub trait EventFilter {
    fn pre_handle_key_event(&mut self, _tree: &WindowTree, _target: WindowId, _event: &mut KeyEvent) -> bool {
        false
    }

    fn pre_handle_mouse_event(&mut self, _tree: &WindowTree, _target: WindowId, _event: &mut MouseEvent) -> bool {
        false
    }

    fn pre_handle_touch_event(
        &mut self,
        _tree: &WindowTree,
        _target: WindowId,
        _event: &mut TouchEvent,
    ) -> TouchStatus {
        TouchStatus::Unknown
    }

    fn pre_handle_gesture_event(
        &mut self,
        _tree: &WindowTree,
        _target: WindowId,
        _event: &mut GestureEvent,
    ) -> GestureStatus {
        GestureStatus::Unknown
    }
}

/// Collects the windows owning a filter from `start` up to the root,
/// nearest ancestor first.
///
/// Callers walk the result in reverse so the root-level filter gets first
/// refusal; a global modal filter can then block an event before any more
/// local filter sees it. `out` is cleared first so one buffer can be reused
/// across dispatches.
pub fn collect_filter_owners(tree: &WindowTree, start: Option<WindowId>, out: &mut Vec<WindowId>) {
    out.clear();
    let mut current = start;
    while let Some(id) = current {
        let Some(window) = tree.get(id) else {
            break;
        };
        if window.has_event_filter() {
            out.push(id);
        }
        current = window.parent();
    }
}
