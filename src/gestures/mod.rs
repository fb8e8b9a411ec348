//! Gesture recognition from raw touches
//!
//! The recognizer keeps one [`GestureSequence`] per target window and
//! remembers which window each touch id went to, so later touches and the
//! gestures they produce are routed to the same place. Touches whose fate
//! is not decided yet are parked in a per-window queue and fed to the
//! sequence once the host says whether they were consumed.

pub mod point;
pub mod sequence;

pub use point::{GesturePoint, VelocityCalculator};
pub use sequence::{GestureSequence, GestureState, ScrollType, MAX_GESTURE_POINTS};

use crate::config::GestureConfig;
use crate::event::{EventType, GestureEvent, TouchEvent, TouchStatus};
use crate::window::WindowId;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// A long-press timer the owner should arm for a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPressTimer {
    pub window: WindowId,
    pub token: u64,
    pub delay: Duration,
}

/// What one recognizer step produced.
#[derive(Debug, Default)]
pub struct Gestures {
    pub events: Vec<GestureEvent>,
    pub long_press: Option<LongPressTimer>,
}

impl Gestures {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.long_press.is_none()
    }
}

#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    /// Window each touch id was delivered to; cleared on release.
    touch_id_target: HashMap<u32, WindowId>,
    /// Window gestures for each touch id go to.
    touch_id_target_for_gestures: HashMap<u32, WindowId>,
    sequences: HashMap<WindowId, GestureSequence>,
    queues: HashMap<WindowId, VecDeque<TouchEvent>>,
    next_long_press_token: u64,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            touch_id_target: HashMap::new(),
            touch_id_target_for_gestures: HashMap::new(),
            sequences: HashMap::new(),
            queues: HashMap::new(),
            next_long_press_token: 0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Window that received earlier touches with this id, if any.
    pub fn target_for_touch_event(&self, event: &TouchEvent) -> Option<WindowId> {
        self.touch_id_target.get(&event.touch_id).copied()
    }

    /// Window the gesture's lowest touch id is bound to.
    pub fn target_for_gesture_event(&self, event: &GestureEvent) -> Option<WindowId> {
        let touch_id = event.lowest_touch_id()?;
        self.touch_id_target_for_gestures.get(&touch_id).copied()
    }

    /// Feeds a touch that has been dispatched to `target` and returns the
    /// gestures it produced.
    pub fn process_touch_event_for_gesture(
        &mut self,
        event: &TouchEvent,
        status: TouchStatus,
        target: WindowId,
    ) -> Gestures {
        self.touch_id_target_for_gestures.insert(event.touch_id, target);
        match event.event_type {
            EventType::TouchReleased | EventType::TouchCancelled => {
                self.touch_id_target.remove(&event.touch_id);
            }
            _ => {
                self.touch_id_target.insert(event.touch_id, target);
            }
        }

        let config = &self.config;
        let sequence = self
            .sequences
            .entry(target)
            .or_insert_with(|| GestureSequence::new(config.clone()));
        let events = sequence.process_touch_event(event, status);

        let long_press = if sequence.take_long_press_request() {
            self.next_long_press_token += 1;
            let token = self.next_long_press_token;
            sequence.arm_long_press(token);
            Some(LongPressTimer {
                window: target,
                token,
                delay: self.config.long_press_time(),
            })
        } else {
            None
        };

        Gestures { events, long_press }
    }

    /// Parks a touch whose consumption is not decided yet.
    pub fn queue_touch_event_for_gesture(&mut self, window: WindowId, event: &TouchEvent) {
        self.queues.entry(window).or_default().push_back(event.clone());
    }

    /// Pops the oldest queued touch for `window` and feeds it to the
    /// sequence as consumed (`processed`) or not.
    pub fn advance_touch_queue(&mut self, window: WindowId, processed: bool) -> Gestures {
        let Some(event) = self.queues.get_mut(&window).and_then(VecDeque::pop_front) else {
            warn!("Advancing an empty touch queue for {:?}", window);
            return Gestures::default();
        };
        let status = if processed {
            TouchStatus::Continue
        } else {
            TouchStatus::Unknown
        };
        self.process_touch_event_for_gesture(&event, status, window)
    }

    pub fn queued_touch_events(&self, window: WindowId) -> usize {
        self.queues.get(&window).map_or(0, VecDeque::len)
    }

    /// Drops every trace of `window`: its sequence, its queued touches and
    /// the touch ids routed to it.
    pub fn flush_touch_queue(&mut self, window: WindowId) {
        let had_state = self.sequences.remove(&window).is_some() | self.queues.remove(&window).is_some();
        self.touch_id_target.retain(|_, w| *w != window);
        self.touch_id_target_for_gestures.retain(|_, w| *w != window);
        if had_state {
            debug!("Flushed gesture state for {:?}", window);
        }
    }

    pub fn sequence(&self, window: WindowId) -> Option<&GestureSequence> {
        self.sequences.get(&window)
    }

    /// Fires the long press armed under `token` for `window`, if the
    /// sequence is still waiting on it.
    pub fn long_press(&mut self, window: WindowId, token: u64) -> Option<GestureEvent> {
        self.sequences.get_mut(&window)?.long_press(token)
    }
}

#[cfg(test)]
mod tests;
