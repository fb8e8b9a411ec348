//! Input event types routed through the root window
//!
//! Located events carry two positions: `location`, which is relative to the
//! window the event is currently addressed to, and `root_location`, which
//! stays in root window coordinates while the event is translated between
//! windows.

use crate::geometry::{Point, Transform};
use bitflags::bitflags;
use std::time::Duration;

/// Event type for every category the root window dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Unknown,
    MousePressed,
    MouseDragged,
    MouseReleased,
    MouseMoved,
    MouseEntered,
    MouseExited,
    MouseCaptureChanged,
    Scroll,
    KeyPressed,
    KeyReleased,
    TouchPressed,
    TouchReleased,
    TouchMoved,
    TouchStationary,
    TouchCancelled,
    GestureTapDown,
    GestureTap,
    GestureDoubleTap,
    GestureLongPress,
    GestureScrollBegin,
    GestureScrollUpdate,
    GestureScrollEnd,
    GesturePinchBegin,
    GesturePinchUpdate,
    GesturePinchEnd,
}

impl EventType {
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            EventType::MousePressed
                | EventType::MouseDragged
                | EventType::MouseReleased
                | EventType::MouseMoved
                | EventType::MouseEntered
                | EventType::MouseExited
                | EventType::MouseCaptureChanged
                | EventType::Scroll
        )
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            EventType::TouchPressed
                | EventType::TouchReleased
                | EventType::TouchMoved
                | EventType::TouchStationary
                | EventType::TouchCancelled
        )
    }

    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            EventType::GestureTapDown
                | EventType::GestureTap
                | EventType::GestureDoubleTap
                | EventType::GestureLongPress
                | EventType::GestureScrollBegin
                | EventType::GestureScrollUpdate
                | EventType::GestureScrollEnd
                | EventType::GesturePinchBegin
                | EventType::GesturePinchUpdate
                | EventType::GesturePinchEnd
        )
    }
}

bitflags! {
    /// Platform modifier and button state plus dispatch annotations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        const CAPS_LOCK_DOWN = 1 << 0;
        const SHIFT_DOWN = 1 << 1;
        const CONTROL_DOWN = 1 << 2;
        const ALT_DOWN = 1 << 3;
        const LEFT_MOUSE_BUTTON = 1 << 4;
        const MIDDLE_MOUSE_BUTTON = 1 << 5;
        const RIGHT_MOUSE_BUTTON = 1 << 6;
        const IS_DOUBLE_CLICK = 1 << 16;
        const IS_NON_CLIENT = 1 << 17;
        const IS_SYNTHESIZED = 1 << 18;
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        EventFlags::empty()
    }
}

impl EventFlags {
    /// The bits that describe mouse buttons.
    pub const BUTTON_MASK: EventFlags = EventFlags::LEFT_MOUSE_BUTTON
        .union(EventFlags::MIDDLE_MOUSE_BUTTON)
        .union(EventFlags::RIGHT_MOUSE_BUTTON);

    pub fn buttons(&self) -> EventFlags {
        self.intersection(Self::BUTTON_MASK)
    }
}

/// Result of offering a touch event to a filter or delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchStatus {
    /// Not handled; gesture recognition may use the touch.
    Unknown,
    /// The touch started a consumer-owned sequence.
    Start,
    /// The touch continued a consumer-owned sequence.
    Continue,
    /// The touch ended a consumer-owned sequence.
    End,
    /// The consumer will decide later; the touch is queued for gestures.
    Queued,
    /// Queued, and the touch ends the consumer-owned sequence.
    QueuedEnd,
}

impl TouchStatus {
    pub fn is_queued(&self) -> bool {
        matches!(self, TouchStatus::Queued | TouchStatus::QueuedEnd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureStatus {
    Unknown,
    Consumed,
    /// Not handled as a gesture, but the synthesized mouse events were.
    SynthMouse,
}

/// Non-client hit-test codes reported by window delegates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTestCode {
    Nowhere,
    Client,
    Caption,
    SysMenu,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Border,
}

impl HitTestCode {
    pub fn is_non_client(&self) -> bool {
        !matches!(self, HitTestCode::Client | HitTestCode::Nowhere)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Unknown,
    Back,
    Tab,
    Return,
    Escape,
    Space,
    Left,
    Up,
    Right,
    Down,
    Delete,
    Character(char),
    Function(u8),
}

/// Mouse, mouse-wheel and capture-changed events
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub event_type: EventType,
    pub location: Point,
    pub root_location: Point,
    pub flags: EventFlags,
    pub time_stamp: Duration,
    /// Scroll offsets; zero for everything except `EventType::Scroll`.
    pub x_offset: i32,
    pub y_offset: i32,
}

impl MouseEvent {
    pub fn new(event_type: EventType, location: Point, root_location: Point, flags: EventFlags) -> Self {
        Self {
            event_type,
            location,
            root_location,
            flags,
            time_stamp: Duration::ZERO,
            x_offset: 0,
            y_offset: 0,
        }
    }

    /// An event whose location and root location are the same point.
    pub fn at(event_type: EventType, point: Point, flags: EventFlags) -> Self {
        Self::new(event_type, point, point, flags)
    }

    pub fn scroll(point: Point, x_offset: i32, y_offset: i32, flags: EventFlags) -> Self {
        Self {
            x_offset,
            y_offset,
            ..Self::at(EventType::Scroll, point, flags)
        }
    }

    pub fn with_time_stamp(mut self, time_stamp: Duration) -> Self {
        self.time_stamp = time_stamp;
        self
    }

    /// Copy of this event re-addressed at `location` with a new type and flags.
    pub fn translated(&self, location: Point, event_type: EventType, flags: EventFlags) -> Self {
        Self {
            event_type,
            location,
            flags,
            ..self.clone()
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.flags.contains(EventFlags::IS_SYNTHESIZED)
    }

    /// Maps a host location into root coordinates.
    pub fn update_for_root_transform(&mut self, root_transform: &Transform) {
        if let Some(p) = root_transform.transform_point_reverse(self.location) {
            self.location = p;
            self.root_location = p;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub event_type: EventType,
    pub key_code: KeyCode,
    pub flags: EventFlags,
    pub time_stamp: Duration,
}

impl KeyEvent {
    pub fn new(event_type: EventType, key_code: KeyCode, flags: EventFlags) -> Self {
        Self {
            event_type,
            key_code,
            flags,
            time_stamp: Duration::ZERO,
        }
    }

    pub fn pressed(key_code: KeyCode) -> Self {
        Self::new(EventType::KeyPressed, key_code, EventFlags::empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub event_type: EventType,
    pub location: Point,
    pub root_location: Point,
    pub touch_id: u32,
    pub flags: EventFlags,
    pub time_stamp: Duration,
    pub radius_x: f32,
    pub radius_y: f32,
    pub rotation_angle: f32,
    pub force: f32,
}

impl TouchEvent {
    pub fn new(event_type: EventType, location: Point, touch_id: u32, time_stamp: Duration) -> Self {
        Self {
            event_type,
            location,
            root_location: location,
            touch_id,
            flags: EventFlags::empty(),
            time_stamp,
            radius_x: 1.0,
            radius_y: 1.0,
            rotation_angle: 0.0,
            force: 0.0,
        }
    }

    pub fn with_location(&self, location: Point) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }

    pub fn update_for_root_transform(&mut self, root_transform: &Transform) {
        if let Some(p) = root_transform.transform_point_reverse(self.location) {
            self.location = p;
            self.root_location = p;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub event_type: EventType,
    pub location: Point,
    pub root_location: Point,
    pub flags: EventFlags,
    pub time_stamp: Duration,
    pub delta_x: f32,
    pub delta_y: f32,
    /// One bit per touch id participating in the gesture.
    pub touch_ids_bitfield: u32,
}

impl GestureEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: EventType,
        location: Point,
        flags: EventFlags,
        time_stamp: Duration,
        delta_x: f32,
        delta_y: f32,
        touch_ids_bitfield: u32,
    ) -> Self {
        Self {
            event_type,
            location,
            root_location: location,
            flags,
            time_stamp,
            delta_x,
            delta_y,
            touch_ids_bitfield,
        }
    }

    /// The smallest touch id taking part in this gesture.
    pub fn lowest_touch_id(&self) -> Option<u32> {
        if self.touch_ids_bitfield == 0 {
            None
        } else {
            Some(self.touch_ids_bitfield.trailing_zeros())
        }
    }

    pub fn with_location(&self, location: Point) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }
}

/// Any event the root window can be asked to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mouse(MouseEvent),
    Key(KeyEvent),
    Touch(TouchEvent),
    Gesture(GestureEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Mouse(e) => e.event_type,
            Event::Key(e) => e.event_type,
            Event::Touch(e) => e.event_type,
            Event::Gesture(e) => e.event_type,
        }
    }

    pub fn flags(&self) -> EventFlags {
        match self {
            Event::Mouse(e) => e.flags,
            Event::Key(e) => e.flags,
            Event::Touch(e) => e.flags,
            Event::Gesture(e) => e.flags,
        }
    }
}
