//! Event routing
//!
//! Every `dispatch_*` entry point takes an event in host coordinates,
//! maps it into root coordinates, resolves a target window and hands a
//! copy translated into the target's coordinates to `process_*`, which
//! runs the ancestor filter chain and then the target's delegate.

use super::RootWindow;
use crate::filter::{collect_filter_owners, EventFilter};
use crate::event::{
    EventFlags, EventType, GestureEvent, GestureStatus, KeyCode, KeyEvent, MouseEvent, TouchEvent, TouchStatus,
};
use crate::gestures::Gestures;
use crate::geometry::Point;
use crate::task::Task;
use crate::window::{WindowId, WindowTree};
use log::{debug, trace};

impl RootWindow {
    /// Dispatches a mouse event from the host. Returns whether a filter or
    /// delegate handled it.
    ///
    /// While mouse moves are held, dragged and synthesized moves are
    /// coalesced into a single held event instead.
    pub fn dispatch_mouse_event(&mut self, event: &MouseEvent) -> bool {
        if self.mouse_move_hold_count > 0 {
            if event.event_type == EventType::MouseDragged || event.is_synthesized() {
                trace!("Holding {:?} at {}", event.event_type, event.location);
                self.held_mouse_move = Some(event.clone());
                return true;
            }
            self.dispatch_held_mouse_move();
        }
        self.dispatch_mouse_event_impl(event.clone())
    }

    pub fn dispatch_key_event(&mut self, event: &KeyEvent) -> bool {
        self.dispatch_held_mouse_move();
        if event.key_code == KeyCode::Unknown {
            return false;
        }
        let blocked = match (&self.event_client, self.live(self.focused_window)) {
            (Some(client), Some(focused)) => !client.can_process_events_within_subtree(&self.tree, focused),
            _ => false,
        };
        if blocked {
            debug!("Key event blocked for {:?}, clearing focus", self.focused_window);
            self.set_focused_window(None, None);
            return false;
        }
        let mut event = event.clone();
        self.process_key_event(self.live(self.focused_window), &mut event)
    }

    /// Scroll events go where a mouse event at the same place would.
    pub fn dispatch_scroll_event(&mut self, event: &MouseEvent) -> bool {
        self.dispatch_held_mouse_move();
        let mut event = event.clone();
        event.update_for_root_transform(&self.root_transform());

        self.last_mouse_location = event.location;
        self.synthesize_mouse_move = false;

        let Some(target) = self.mouse_target(event.location) else {
            return false;
        };
        self.deliver_mouse_event(target, &event, event.event_type, true)
    }

    pub fn dispatch_touch_event(&mut self, event: &TouchEvent) -> bool {
        self.dispatch_held_mouse_move();
        let mut event = event.clone();
        event.update_for_root_transform(&self.root_transform());

        let target = self
            .live(self.capture_window)
            .or_else(|| self.live(self.gesture_recognizer.target_for_touch_event(&event)))
            .or_else(|| self.handler_for_point(event.location));
        let Some(target) = target else {
            return false;
        };

        let status = match self.tree.convert_point(Some(self.root), target, event.location) {
            Some(local) => {
                let mut translated = event.with_location(local);
                self.process_touch_event(target, &mut translated)
            }
            None => TouchStatus::Unknown,
        };
        let mut handled = status != TouchStatus::Unknown;

        if status.is_queued() {
            self.gesture_recognizer.queue_touch_event_for_gesture(target, &event);
        }

        let gestures = self
            .gesture_recognizer
            .process_touch_event_for_gesture(&event, status, target);
        if self.process_gestures(gestures) {
            handled = true;
        }
        handled
    }

    /// Dispatches a gesture in root coordinates to the capture window or
    /// to the window its touches went to.
    pub fn dispatch_gesture_event(&mut self, event: &GestureEvent) -> bool {
        self.dispatch_held_mouse_move();

        let target = self
            .live(self.capture_window)
            .or_else(|| self.live(self.gesture_recognizer.target_for_gesture_event(event)));
        let Some(target) = target else {
            return false;
        };
        let Some(local) = self.tree.convert_point(Some(self.root), target, event.location) else {
            return false;
        };
        let mut translated = event.with_location(local);
        self.process_gesture_event(target, &mut translated) != GestureStatus::Unknown
    }

    /// The host has decided on a queued touch for `window`; replays it
    /// into the recognizer and dispatches whatever gestures result.
    pub fn advance_queued_touch_event(&mut self, window: WindowId, processed: bool) {
        let gestures = self.gesture_recognizer.advance_touch_queue(window, processed);
        self.process_gestures(gestures);
    }

    pub(super) fn dispatch_held_mouse_move(&mut self) {
        if let Some(held) = self.held_mouse_move.take() {
            // A pending synthesized move means the held location is stale.
            if !self.synthesize_mouse_move {
                self.dispatch_mouse_event_impl(held);
            }
        }
    }

    pub(super) fn synthesize_mouse_move_event(&mut self) {
        if !self.synthesize_mouse_move {
            return;
        }
        self.synthesize_mouse_move = false;
        let location = self.root_transform().transform_point(self.last_mouse_location);
        trace!("Synthesizing mouse move at {}", location);
        let event = MouseEvent::at(EventType::MouseMoved, location, EventFlags::IS_SYNTHESIZED);
        self.dispatch_mouse_event(&event);
    }

    pub(super) fn fire_long_press(&mut self, window: WindowId, token: u64) {
        if !self.tree.exists(window) {
            return;
        }
        if let Some(gesture) = self.gesture_recognizer.long_press(window, token) {
            self.dispatch_gesture_event(&gesture);
        }
    }

    fn dispatch_mouse_event_impl(&mut self, mut event: MouseEvent) -> bool {
        event.update_for_root_transform(&self.root_transform());

        self.last_mouse_location = event.location;
        self.synthesize_mouse_move = false;

        let target = self.mouse_target(event.location);
        match event.event_type {
            EventType::MouseMoved => self.handle_mouse_moved(&event, target),
            EventType::MousePressed => {
                if self.live(self.mouse_pressed_handler).is_none() {
                    self.mouse_pressed_handler = target;
                }
                self.mouse_button_flags |= event.flags.buttons();
                self.env.set_mouse_button_flags(self.mouse_button_flags);
            }
            EventType::MouseReleased => {
                self.mouse_pressed_handler = None;
                self.mouse_button_flags.remove(event.flags.buttons());
                self.env.set_mouse_button_flags(self.mouse_button_flags);
            }
            _ => {}
        }

        match target {
            Some(target) => self.deliver_mouse_event(target, &event, event.event_type, true),
            None => false,
        }
    }

    /// Pressed handler, then capture, then a hit test at `location`.
    fn mouse_target(&self, location: Point) -> Option<WindowId> {
        self.live(self.mouse_pressed_handler)
            .or_else(|| self.live(self.capture_window))
            .or_else(|| self.handler_for_point(location))
    }

    fn handler_for_point(&self, location: Point) -> Option<WindowId> {
        self.tree
            .get_event_handler_for_point(self.root, location, self.event_client.as_deref())
    }

    /// Synthesizes exit and enter events when the pointer changes windows.
    fn handle_mouse_moved(&mut self, event: &MouseEvent, target: Option<WindowId>) {
        let previous = self.live(self.mouse_moved_handler);
        if target == previous {
            return;
        }
        if let Some(previous) = previous {
            self.deliver_mouse_event(previous, event, EventType::MouseExited, false);
        }
        self.mouse_moved_handler = target;
        if let Some(target) = target {
            self.deliver_mouse_event(target, event, EventType::MouseEntered, false);
        }
    }

    /// Translates a root-coordinate mouse event into `target`'s space and
    /// processes it. Windows without a delegate never see mouse events.
    fn deliver_mouse_event(
        &mut self,
        target: WindowId,
        event: &MouseEvent,
        event_type: EventType,
        mark_non_client: bool,
    ) -> bool {
        if self.tree.delegate(target).is_none() {
            return false;
        }
        let Some(local) = self.tree.convert_point(Some(self.root), target, event.location) else {
            return false;
        };
        let mut flags = event.flags;
        if mark_non_client && self.is_non_client_location(target, local) {
            flags |= EventFlags::IS_NON_CLIENT;
        }
        let mut translated = event.translated(local, event_type, flags);
        self.process_mouse_event(target, &mut translated)
    }

    fn is_non_client_location(&self, target: WindowId, local: Point) -> bool {
        self.tree
            .delegate(target)
            .map(|d| d.non_client_component(local).is_non_client())
            .unwrap_or(false)
    }

    /// Offers an event to the filters of `start` and its ancestors,
    /// outermost first, until one returns `Some`.
    fn run_filters<R>(
        &mut self,
        start: Option<WindowId>,
        mut offer: impl FnMut(&mut dyn EventFilter, &WindowTree) -> Option<R>,
    ) -> Option<R> {
        let mut owners = std::mem::take(&mut self.filter_scratch);
        collect_filter_owners(&self.tree, start, &mut owners);

        let mut result = None;
        for &owner in owners.iter().rev() {
            let Some(mut filter) = self.tree.take_event_filter(owner) else {
                continue;
            };
            let outcome = offer(filter.as_mut(), &self.tree);
            self.tree.restore_event_filter(owner, filter);
            if outcome.is_some() {
                trace!("Event consumed by filter on {:?}", owner);
                result = outcome;
                break;
            }
        }

        self.filter_scratch = owners;
        result
    }

    pub(super) fn process_mouse_event(&mut self, target: WindowId, event: &mut MouseEvent) -> bool {
        if !self.tree.is_visible(target) {
            return false;
        }
        let start = self.tree.parent(target);
        let consumed = self.run_filters(start, |filter, tree| {
            filter.pre_handle_mouse_event(tree, target, event).then_some(())
        });
        if consumed.is_some() {
            return true;
        }
        match self.tree.delegate(target) {
            Some(delegate) => delegate.on_mouse_event(event),
            None => false,
        }
    }

    /// With nothing focused the root is the target, so root-level filters
    /// still see global shortcuts.
    fn process_key_event(&mut self, target: Option<WindowId>, event: &mut KeyEvent) -> bool {
        let (target, start) = match target {
            Some(target) => {
                if !self.tree.is_visible(target) {
                    return false;
                }
                (target, self.tree.parent(target))
            }
            None => (self.root, Some(self.root)),
        };
        let consumed = self.run_filters(start, |filter, tree| {
            filter.pre_handle_key_event(tree, target, event).then_some(())
        });
        if consumed.is_some() {
            return true;
        }
        match self.tree.delegate(target) {
            Some(delegate) => delegate.on_key_event(event),
            None => false,
        }
    }

    fn process_touch_event(&mut self, target: WindowId, event: &mut TouchEvent) -> TouchStatus {
        if !self.tree.is_visible(target) {
            return TouchStatus::Unknown;
        }
        let start = self.tree.parent(target);
        let filtered = self.run_filters(start, |filter, tree| {
            let status = filter.pre_handle_touch_event(tree, target, event);
            (status != TouchStatus::Unknown).then_some(status)
        });
        if let Some(status) = filtered {
            return status;
        }
        match self.tree.delegate(target) {
            Some(delegate) => delegate.on_touch_event(event),
            None => TouchStatus::Unknown,
        }
    }

    fn process_gesture_event(&mut self, target: WindowId, event: &mut GestureEvent) -> GestureStatus {
        if !self.tree.is_visible(target) {
            return GestureStatus::Unknown;
        }
        let start = self.tree.parent(target);
        let filtered = self.run_filters(start, |filter, tree| {
            let status = filter.pre_handle_gesture_event(tree, target, event);
            (status != GestureStatus::Unknown).then_some(status)
        });
        if let Some(status) = filtered {
            return status;
        }

        let mut status = match self.tree.delegate(target) {
            Some(delegate) => delegate.on_gesture_event(event),
            None => GestureStatus::Unknown,
        };

        // An unhandled tap becomes a click.
        if status == GestureStatus::Unknown
            && matches!(event.event_type, EventType::GestureTap | EventType::GestureDoubleTap)
        {
            let click = [
                EventType::MouseEntered,
                EventType::MousePressed,
                EventType::MouseReleased,
                EventType::MouseExited,
            ];
            for event_type in click {
                let mut flags = event.flags;
                if event.event_type == EventType::GestureDoubleTap && event_type == EventType::MousePressed {
                    flags |= EventFlags::IS_DOUBLE_CLICK;
                }
                let mut synth = MouseEvent::new(event_type, event.location, event.root_location, flags)
                    .with_time_stamp(event.time_stamp);
                if self.process_mouse_event(target, &mut synth) {
                    status = GestureStatus::SynthMouse;
                }
            }
        }

        status
    }

    /// Arms the long-press timer, if any, and dispatches each gesture.
    fn process_gestures(&mut self, gestures: Gestures) -> bool {
        if let Some(timer) = gestures.long_press {
            self.tasks.borrow_mut().post_delayed(
                Task::LongPress {
                    window: timer.window,
                    token: timer.token,
                },
                timer.delay,
            );
        }
        let mut handled = false;
        for gesture in &gestures.events {
            if self.dispatch_gesture_event(gesture) {
                handled = true;
            }
        }
        handled
    }
}
