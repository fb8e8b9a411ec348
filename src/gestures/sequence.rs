//! Touch-to-gesture state machine for one target window
//!
//! The sequence tracks up to [`MAX_GESTURE_POINTS`] fingers. Each press
//! takes the next free point id so the ids of the fingers currently down
//! are always `0..point_count`; a release shifts the higher ids down.
//! Transitions are picked from the current state, the point id of the
//! finger that moved and what it did.

use super::point::GesturePoint;
use crate::config::GestureConfig;
use crate::event::{EventFlags, EventType, GestureEvent, TouchEvent, TouchStatus};
use crate::geometry::Point;
use log::trace;
use std::time::Duration;

/// Touch ids at or above this are ignored.
pub const MAX_GESTURE_POINTS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    NoGesture,
    PendingSyntheticClick,
    Scroll,
    Pinch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollType {
    Free,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchState {
    Released,
    Pressed,
    Moved,
    Stationary,
    Cancelled,
}

impl TouchState {
    fn from_event(event_type: EventType) -> Option<Self> {
        match event_type {
            EventType::TouchReleased => Some(TouchState::Released),
            EventType::TouchPressed => Some(TouchState::Pressed),
            EventType::TouchMoved => Some(TouchState::Moved),
            EventType::TouchStationary => Some(TouchState::Stationary),
            EventType::TouchCancelled => Some(TouchState::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureSequence {
    config: GestureConfig,
    state: GestureState,
    scroll_type: ScrollType,
    flags: EventFlags,
    pinch_distance_start: f32,
    pinch_distance_current: f32,
    points: Vec<GesturePoint>,
    point_count: usize,
    long_press_requested: bool,
    long_press_token: Option<u64>,
}

impl GestureSequence {
    pub fn new(config: GestureConfig) -> Self {
        let points = (0..MAX_GESTURE_POINTS).map(|_| GesturePoint::new(&config)).collect();
        Self {
            config,
            state: GestureState::NoGesture,
            scroll_type: ScrollType::Free,
            flags: EventFlags::empty(),
            pinch_distance_start: 0.0,
            pinch_distance_current: 0.0,
            points,
            point_count: 0,
            long_press_requested: false,
            long_press_token: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn scroll_type(&self) -> ScrollType {
        self.scroll_type
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Feeds one touch event and returns the gestures it completes.
    ///
    /// Only touches nobody consumed (`TouchStatus::Unknown`) take part.
    pub fn process_touch_event(&mut self, event: &TouchEvent, status: TouchStatus) -> Vec<GestureEvent> {
        let mut gestures = Vec::new();
        if status != TouchStatus::Unknown {
            return gestures;
        }
        let Some(touch_state) = TouchState::from_event(event.event_type) else {
            return gestures;
        };
        let touch = event.touch_id as usize;
        if touch >= MAX_GESTURE_POINTS {
            return gestures;
        }

        if touch_state == TouchState::Pressed {
            if self.point_count == MAX_GESTURE_POINTS {
                return gestures;
            }
            if !self.points[touch].in_use() {
                self.points[touch].set_point_id(Some(self.point_count));
                self.points[touch].set_touch_id(event.touch_id);
                self.point_count += 1;
            }
        }

        let last_state = self.state;
        self.points[touch].update_values(event);
        self.flags = event.flags;
        let Some(point_id) = self.points[touch].point_id() else {
            return gestures;
        };

        use GestureState::*;
        use TouchState::*;
        match (self.state, point_id, touch_state) {
            (NoGesture, 0, Pressed) => {
                self.touch_down(touch, &mut gestures);
                self.set_state(PendingSyntheticClick);
            }
            (PendingSyntheticClick, 0, Released) => {
                if self.click(touch, event, &mut gestures) {
                    self.points[touch].update_for_tap();
                }
                self.set_state(NoGesture);
            }
            (PendingSyntheticClick, 0, Moved) | (PendingSyntheticClick, 0, Stationary) => {
                if self.scroll_start(touch, event, &mut gestures) {
                    self.set_state(Scroll);
                    if self.scroll_update(touch, &mut gestures) {
                        self.points[touch].update_for_scroll();
                    }
                }
            }
            (PendingSyntheticClick, 0, Cancelled) => self.reset(),
            (Scroll, 0, Moved) => {
                if self.scroll_type != ScrollType::Free {
                    self.break_rail_scroll(touch);
                }
                if self.scroll_update(touch, &mut gestures) {
                    self.points[touch].update_for_scroll();
                }
            }
            (Scroll, 0, Released) | (Scroll, 0, Cancelled) => {
                self.scroll_end(touch, event, &mut gestures);
                self.set_state(NoGesture);
            }
            (PendingSyntheticClick, 1, Pressed) | (Scroll, 1, Pressed) => {
                self.pinch_start(touch, &mut gestures);
                self.set_state(Pinch);
            }
            (Pinch, 0, Moved) | (Pinch, 1, Moved) => {
                if self.pinch_update(touch, &mut gestures) {
                    for id in 0..2 {
                        if let Some(index) = self.index_of_point_id(id) {
                            self.points[index].update_for_scroll();
                        }
                    }
                }
            }
            (Pinch, 0, Released) | (Pinch, 1, Released) | (Pinch, 0, Cancelled) | (Pinch, 1, Cancelled) => {
                self.pinch_end(touch, &mut gestures);
                // Once pinch ends, it should still be possible to scroll
                // with the remaining finger on the screen.
                self.scroll_type = ScrollType::Free;
                self.set_state(Scroll);
            }
            _ => {}
        }

        if last_state == PendingSyntheticClick && self.state != last_state {
            self.long_press_token = None;
        }

        if matches!(touch_state, Released | Cancelled) {
            if let Some(released) = self.points[touch].point_id() {
                for point in &mut self.points {
                    if let Some(id) = point.point_id() {
                        if id > released {
                            point.set_point_id(Some(id - 1));
                        }
                    }
                }
            }
            self.points[touch].reset();
            self.point_count = self.point_count.saturating_sub(1);
        }

        gestures
    }

    /// Returns true once after a touch down asked for a long-press timer.
    pub fn take_long_press_request(&mut self) -> bool {
        std::mem::take(&mut self.long_press_requested)
    }

    pub fn arm_long_press(&mut self, token: u64) {
        self.long_press_token = Some(token);
    }

    pub fn long_press_pending(&self) -> bool {
        self.long_press_token.is_some()
    }

    /// Fires the long press armed with `token`, if it is still armed.
    pub fn long_press(&mut self, token: u64) -> Option<GestureEvent> {
        if self.long_press_token != Some(token) {
            return None;
        }
        self.long_press_token = None;
        let index = self.index_of_point_id(0)?;
        let point = &self.points[index];
        trace!("Long press at {}", point.first_touch_position());
        Some(GestureEvent::new(
            EventType::GestureLongPress,
            point.first_touch_position(),
            self.flags,
            point.last_touch_time(),
            0.0,
            0.0,
            1u32 << point.touch_id(),
        ))
    }

    fn set_state(&mut self, state: GestureState) {
        if self.state != state {
            trace!("Gesture state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    fn reset(&mut self) {
        self.set_state(GestureState::NoGesture);
        for point in &mut self.points {
            point.reset();
        }
        self.point_count = 0;
    }

    fn index_of_point_id(&self, point_id: usize) -> Option<usize> {
        self.points.iter().position(|p| p.point_id() == Some(point_id))
    }

    fn gesture(&self, event_type: EventType, location: Point, time_stamp: Duration, dx: f32, dy: f32, touch_ids: u32) -> GestureEvent {
        GestureEvent::new(event_type, location, self.flags, time_stamp, dx, dy, touch_ids)
    }

    fn touch_down(&mut self, touch: usize, gestures: &mut Vec<GestureEvent>) {
        let point = &self.points[touch];
        gestures.push(self.gesture(
            EventType::GestureTapDown,
            point.first_touch_position(),
            point.last_touch_time(),
            0.0,
            0.0,
            1u32 << point.touch_id(),
        ));
        self.long_press_requested = true;
    }

    fn click(&mut self, touch: usize, event: &TouchEvent, gestures: &mut Vec<GestureEvent>) -> bool {
        let point = &self.points[touch];
        if !point.is_in_click_window(event, &self.config) {
            return false;
        }
        let bit = 1u32 << point.touch_id();
        gestures.push(self.gesture(
            EventType::GestureTap,
            point.first_touch_position(),
            point.last_touch_time(),
            0.0,
            0.0,
            bit,
        ));
        if point.is_in_double_click_window(event, &self.config) {
            gestures.push(self.gesture(
                EventType::GestureDoubleTap,
                point.first_touch_position(),
                point.last_touch_time(),
                0.0,
                0.0,
                bit,
            ));
        }
        true
    }

    fn scroll_start(&mut self, touch: usize, event: &TouchEvent, gestures: &mut Vec<GestureEvent>) -> bool {
        let point = &self.points[touch];
        if point.is_in_click_window(event, &self.config)
            || !point.is_in_scroll_window(event, &self.config)
            || !point.has_enough_data_to_establish_rail(&self.config)
        {
            return false;
        }
        gestures.push(self.gesture(
            EventType::GestureScrollBegin,
            point.first_touch_position(),
            point.last_touch_time(),
            0.0,
            0.0,
            1u32 << point.touch_id(),
        ));
        self.scroll_type = if point.is_in_horizontal_rail_window(&self.config) {
            ScrollType::Horizontal
        } else if point.is_in_vertical_rail_window(&self.config) {
            ScrollType::Vertical
        } else {
            ScrollType::Free
        };
        true
    }

    fn break_rail_scroll(&mut self, touch: usize) {
        let point = &self.points[touch];
        let broken = match self.scroll_type {
            ScrollType::Horizontal => point.breaks_horizontal_rail(&self.config),
            ScrollType::Vertical => point.breaks_vertical_rail(&self.config),
            ScrollType::Free => false,
        };
        if broken {
            self.scroll_type = ScrollType::Free;
        }
    }

    fn scroll_update(&mut self, touch: usize, gestures: &mut Vec<GestureEvent>) -> bool {
        let point = &self.points[touch];
        if !point.did_scroll(0) {
            return false;
        }
        let (dx, dy) = self.railed(point.x_delta() as f32, point.y_delta() as f32);
        gestures.push(self.gesture(
            EventType::GestureScrollUpdate,
            point.last_touch_position(),
            point.last_touch_time(),
            dx,
            dy,
            1u32 << point.touch_id(),
        ));
        true
    }

    fn scroll_end(&mut self, touch: usize, event: &TouchEvent, gestures: &mut Vec<GestureEvent>) {
        let point = &self.points[touch];
        let (vx, vy) = if point.is_in_flick_window(event, &self.config) {
            self.railed(point.x_velocity(), point.y_velocity())
        } else {
            (0.0, 0.0)
        };
        gestures.push(self.gesture(
            EventType::GestureScrollEnd,
            point.last_touch_position(),
            point.last_touch_time(),
            vx,
            vy,
            1u32 << point.touch_id(),
        ));
    }

    fn railed(&self, x: f32, y: f32) -> (f32, f32) {
        match self.scroll_type {
            ScrollType::Horizontal => (x, 0.0),
            ScrollType::Vertical => (0.0, y),
            ScrollType::Free => (x, y),
        }
    }

    /// The two lowest point ids, which drive a pinch.
    fn pinch_points(&self) -> Option<(usize, usize)> {
        Some((self.index_of_point_id(0)?, self.index_of_point_id(1)?))
    }

    fn pinch_start(&mut self, touch: usize, gestures: &mut Vec<GestureEvent>) {
        let Some((first, second)) = self.pinch_points() else {
            return;
        };
        let (p1, p2) = (&self.points[first], &self.points[second]);
        let point = &self.points[touch];
        let time = point.last_touch_time();
        let both = (1u32 << p1.touch_id()) | (1u32 << p2.touch_id());
        let center = p1.last_touch_position().middle(p2.last_touch_position());

        gestures.push(self.gesture(
            EventType::GestureTapDown,
            point.first_touch_position(),
            time,
            0.0,
            0.0,
            1u32 << point.touch_id(),
        ));

        let distance = p1.distance(p2);
        gestures.push(self.gesture(EventType::GesturePinchBegin, center, time, 0.0, 0.0, both));

        if self.state == GestureState::PendingSyntheticClick {
            gestures.push(self.gesture(EventType::GestureScrollBegin, center, time, 0.0, 0.0, both));
        }

        self.pinch_distance_start = distance;
        self.pinch_distance_current = distance;
    }

    fn pinch_update(&mut self, touch: usize, gestures: &mut Vec<GestureEvent>) -> bool {
        let Some((first, second)) = self.pinch_points() else {
            return false;
        };
        let (p1, p2) = (&self.points[first], &self.points[second]);
        let point = &self.points[touch];
        let time = point.last_touch_time();
        let both = (1u32 << p1.touch_id()) | (1u32 << p2.touch_id());
        let center = p1.last_touch_position().middle(p2.last_touch_position());
        let distance = p1.distance(p2);

        if (distance - self.pinch_distance_current).abs() < self.config.min_pinch_update_distance_in_pixels {
            // The fingers kept their spacing: treat it as a two-finger
            // scroll once both have travelled far enough.
            let min_scroll = self.config.min_distance_for_pinch_scroll_in_pixels;
            if !p1.did_scroll(min_scroll) || !p2.did_scroll(min_scroll) {
                return false;
            }
            gestures.push(self.gesture(
                EventType::GestureScrollUpdate,
                center,
                time,
                point.x_delta() as f32,
                point.y_delta() as f32,
                both,
            ));
        } else {
            let scale = if self.pinch_distance_current > 0.0 {
                distance / self.pinch_distance_current
            } else {
                1.0
            };
            gestures.push(self.gesture(EventType::GesturePinchUpdate, center, time, scale, 0.0, both));
            self.pinch_distance_current = distance;
        }
        true
    }

    fn pinch_end(&mut self, touch: usize, gestures: &mut Vec<GestureEvent>) {
        let Some((first, second)) = self.pinch_points() else {
            return;
        };
        let (p1, p2) = (&self.points[first], &self.points[second]);
        let time = self.points[touch].last_touch_time();
        let both = (1u32 << p1.touch_id()) | (1u32 << p2.touch_id());
        let center = p1.last_touch_position().middle(p2.last_touch_position());
        let distance = p1.distance(p2);
        let scale = if self.pinch_distance_start > 0.0 {
            distance / self.pinch_distance_start
        } else {
            1.0
        };
        gestures.push(self.gesture(EventType::GesturePinchEnd, center, time, scale, 0.0, both));

        self.pinch_distance_start = 0.0;
        self.pinch_distance_current = 0.0;
    }
}
