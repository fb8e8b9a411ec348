//! Per-finger state for the gesture sequence
//!
//! A `GesturePoint` follows one touch id from press to release: where and
//! when it went down, where it is now, where the last tap landed and a
//! short history used to estimate its velocity.

use crate::config::GestureConfig;
use crate::event::{EventType, TouchEvent};
use crate::geometry::Point;
use std::collections::VecDeque;
use std::time::Duration;

/// Least-squares velocity over the most recent positions.
#[derive(Debug, Clone)]
pub struct VelocityCalculator {
    capacity: usize,
    samples: VecDeque<(i32, i32, i64)>,
}

impl VelocityCalculator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn point_seen(&mut self, x: i32, y: i32, time_micros: i64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((x, y, time_micros));
    }

    pub fn clear_history(&mut self) {
        self.samples.clear();
    }

    /// Velocity in pixels per second, zero until the buffer is full.
    pub fn velocity(&self) -> (f32, f32) {
        if self.samples.len() < self.capacity {
            return (0.0, 0.0);
        }
        let n = self.samples.len() as f64;
        let (sum_x, sum_y, sum_t) = self
            .samples
            .iter()
            .fold((0.0, 0.0, 0i64), |(sx, sy, st), &(x, y, t)| {
                (sx + f64::from(x), sy + f64::from(y), st + t)
            });
        let mean_x = sum_x / n;
        let mean_y = sum_y / n;
        let mean_t = sum_t / self.samples.len() as i64;

        let mut xt = 0.0;
        let mut yt = 0.0;
        let mut tt = 0i64;
        for &(x, y, t) in &self.samples {
            let t_i = t - mean_t;
            xt += (f64::from(x) - mean_x) * t_i as f64;
            yt += (f64::from(y) - mean_y) * t_i as f64;
            tt += t_i * t_i;
        }
        if tt <= 0 {
            return (0.0, 0.0);
        }
        let tt = tt as f64;
        ((xt / tt * 1_000_000.0) as f32, (yt / tt * 1_000_000.0) as f32)
    }

    pub fn x_velocity(&self) -> f32 {
        self.velocity().0
    }

    pub fn y_velocity(&self) -> f32 {
        self.velocity().1
    }

    pub fn velocity_squared(&self) -> f32 {
        let (vx, vy) = self.velocity();
        vx * vx + vy * vy
    }
}

/// One finger of a gesture sequence.
#[derive(Debug, Clone)]
pub struct GesturePoint {
    point_id: Option<usize>,
    touch_id: u32,
    first_touch_time: Duration,
    last_touch_time: Duration,
    last_tap_time: Option<Duration>,
    first_touch_position: Point,
    last_touch_position: Point,
    last_tap_position: Point,
    velocity: VelocityCalculator,
}

impl GesturePoint {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            point_id: None,
            touch_id: 0,
            first_touch_time: Duration::ZERO,
            last_touch_time: Duration::ZERO,
            last_tap_time: None,
            first_touch_position: Point::default(),
            last_touch_position: Point::default(),
            last_tap_position: Point::default(),
            velocity: VelocityCalculator::new(config.points_buffered_for_velocity),
        }
    }

    /// Frees the slot. Tap history survives so a later press can still
    /// turn into a double tap.
    pub fn reset(&mut self) {
        self.first_touch_time = Duration::ZERO;
        self.last_touch_time = Duration::ZERO;
        self.point_id = None;
        self.velocity.clear_history();
    }

    pub fn in_use(&self) -> bool {
        self.point_id.is_some()
    }

    pub fn point_id(&self) -> Option<usize> {
        self.point_id
    }

    pub fn set_point_id(&mut self, point_id: Option<usize>) {
        self.point_id = point_id;
    }

    pub fn touch_id(&self) -> u32 {
        self.touch_id
    }

    pub fn set_touch_id(&mut self, touch_id: u32) {
        self.touch_id = touch_id;
    }

    pub fn first_touch_position(&self) -> Point {
        self.first_touch_position
    }

    pub fn last_touch_position(&self) -> Point {
        self.last_touch_position
    }

    pub fn last_touch_time(&self) -> Duration {
        self.last_touch_time
    }

    pub fn update_values(&mut self, event: &TouchEvent) {
        let location = event.root_location;
        let micros = i64::try_from(event.time_stamp.as_micros()).unwrap_or(i64::MAX);
        if event.event_type == EventType::TouchMoved {
            self.velocity.point_seen(location.x, location.y, micros);
        }

        self.last_touch_time = event.time_stamp;
        self.last_touch_position = location;

        if event.event_type == EventType::TouchPressed {
            self.first_touch_time = self.last_touch_time;
            self.first_touch_position = location;
            self.velocity.clear_history();
            self.velocity.point_seen(location.x, location.y, micros);
        }
    }

    pub fn update_for_tap(&mut self) {
        self.last_tap_time = Some(self.last_touch_time);
        self.last_tap_position = self.last_touch_position;
        self.reset();
    }

    pub fn update_for_scroll(&mut self) {
        self.first_touch_position = self.last_touch_position;
        self.first_touch_time = self.last_touch_time;
    }

    pub fn is_in_click_window(&self, event: &TouchEvent, config: &GestureConfig) -> bool {
        self.is_in_click_time_window(config) && self.is_inside_manhattan_square(event.root_location, config)
    }

    pub fn is_in_double_click_window(&self, event: &TouchEvent, config: &GestureConfig) -> bool {
        self.is_in_second_click_time_window(config)
            && self.is_second_click_inside_manhattan_square(event.root_location, config)
    }

    pub fn is_in_scroll_window(&self, event: &TouchEvent, config: &GestureConfig) -> bool {
        event.event_type == EventType::TouchMoved
            && !self.is_inside_manhattan_square(event.root_location, config)
    }

    pub fn is_in_flick_window(&self, event: &TouchEvent, config: &GestureConfig) -> bool {
        self.is_over_min_flick_speed(config) && event.event_type != EventType::TouchCancelled
    }

    pub fn did_scroll(&self, distance: i32) -> bool {
        (self.last_touch_position.x - self.first_touch_position.x).abs() > distance
            || (self.last_touch_position.y - self.first_touch_position.y).abs() > distance
    }

    pub fn has_enough_data_to_establish_rail(&self, config: &GestureConfig) -> bool {
        let dx = self.x_delta();
        let dy = self.y_delta();
        dx * dx + dy * dy > config.min_scroll_delta_squared
    }

    pub fn is_in_horizontal_rail_window(&self, config: &GestureConfig) -> bool {
        self.x_delta().abs() > config.rail_start_proportion * self.y_delta().abs()
    }

    pub fn is_in_vertical_rail_window(&self, config: &GestureConfig) -> bool {
        self.y_delta().abs() > config.rail_start_proportion * self.x_delta().abs()
    }

    pub fn breaks_horizontal_rail(&self, config: &GestureConfig) -> bool {
        let (vx, vy) = self.velocity.velocity();
        vy.abs() > config.rail_break_proportion * vx.abs() + config.min_rail_break_velocity
    }

    pub fn breaks_vertical_rail(&self, config: &GestureConfig) -> bool {
        let (vx, vy) = self.velocity.velocity();
        vx.abs() > config.rail_break_proportion * vy.abs() + config.min_rail_break_velocity
    }

    pub fn distance(&self, other: &GesturePoint) -> f32 {
        let dx = f64::from(self.last_touch_position.x - other.last_touch_position.x);
        let dy = f64::from(self.last_touch_position.y - other.last_touch_position.y);
        (dx * dx + dy * dy).sqrt() as f32
    }

    pub fn x_delta(&self) -> i32 {
        self.last_touch_position.x - self.first_touch_position.x
    }

    pub fn y_delta(&self) -> i32 {
        self.last_touch_position.y - self.first_touch_position.y
    }

    pub fn x_velocity(&self) -> f32 {
        self.velocity.x_velocity()
    }

    pub fn y_velocity(&self) -> f32 {
        self.velocity.y_velocity()
    }

    fn is_in_click_time_window(&self, config: &GestureConfig) -> bool {
        let duration = self.last_touch_time.saturating_sub(self.first_touch_time).as_secs_f64();
        duration >= config.min_touch_down_duration_for_click
            && duration < config.max_touch_down_duration_for_click
    }

    fn is_in_second_click_time_window(&self, config: &GestureConfig) -> bool {
        match self.last_tap_time {
            Some(tap) => {
                self.last_touch_time.saturating_sub(tap).as_secs_f64() < config.max_seconds_between_double_click
            }
            None => false,
        }
    }

    fn is_inside_manhattan_square(&self, point: Point, config: &GestureConfig) -> bool {
        let dx = (point.x - self.first_touch_position.x).abs();
        let dy = (point.y - self.first_touch_position.y).abs();
        dx + dy < config.max_touch_move_in_pixels_for_click
    }

    fn is_second_click_inside_manhattan_square(&self, point: Point, config: &GestureConfig) -> bool {
        let dx = (point.x - self.last_tap_position.x).abs();
        let dy = (point.y - self.last_tap_position.y).abs();
        dx + dy < config.max_touch_move_in_pixels_for_click
    }

    fn is_over_min_flick_speed(&self, config: &GestureConfig) -> bool {
        self.velocity.velocity_squared() > config.min_flick_speed_squared
    }
}
