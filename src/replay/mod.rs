//! Scripted replays against a headless root window
//!
//! A replay script is a JSON document with a declarative window tree and a
//! list of steps. Every window gets a [`LoggingDelegate`] that writes one
//! line per delivered event into a shared log, so a script run produces a
//! readable trace of where each event went. Time only moves when a step
//! says so.

use crate::compositor::{Compositor, CompositorLock};
use crate::config::AuraConfig;
use crate::client::Env;
use crate::delegate::WindowDelegate;
use crate::event::{
    EventFlags, EventType, GestureEvent, GestureStatus, KeyCode, KeyEvent, MouseEvent, TouchEvent, TouchStatus,
};
use crate::geometry::{Point, Rect, Size};
use crate::root_window::RootWindow;
use crate::task::ManualClock;
use crate::window::WindowId;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Name scripts use to refer to the root window.
pub const ROOT_NAME: &str = "root";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplayScript {
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ReplayScript {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse replay script: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// One window of the initial tree. Windows are created in order, so a
/// parent must be listed before its children.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub name: String,
    /// Parent window name; the root when absent.
    #[serde(default)]
    pub parent: Option<String>,
    /// `[x, y, width, height]` in parent coordinates.
    pub bounds: [i32; 4],
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub can_focus: bool,
    #[serde(default)]
    pub ignore_events: bool,
    #[serde(default)]
    pub transient_for: Option<String>,
    /// Consume gestures instead of letting taps become clicks.
    #[serde(default)]
    pub consume_gestures: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    Pressed,
    Dragged,
    Released,
    Moved,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Pressed,
    Moved,
    Released,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Mouse {
        action: MouseAction,
        x: i32,
        y: i32,
        #[serde(default)]
        buttons: Vec<MouseButton>,
    },
    Scroll {
        x: i32,
        y: i32,
        #[serde(default)]
        dx: i32,
        #[serde(default)]
        dy: i32,
    },
    /// Key names: a single character, `return`, `tab`, `escape`, `space`,
    /// `back`, `delete`, the arrow names or `f1`..`f24`.
    Key {
        key: String,
    },
    Touch {
        action: TouchAction,
        x: i32,
        y: i32,
        #[serde(default)]
        id: u32,
        time_ms: u64,
    },
    /// Moves the clock forward and runs every task that became due.
    Advance {
        ms: u64,
    },
    RunTasks,
    Focus {
        window: Option<String>,
    },
    Capture {
        window: String,
    },
    ReleaseCapture {
        window: String,
    },
    Show {
        window: String,
    },
    Hide {
        window: String,
    },
    SetBounds {
        window: String,
        bounds: [i32; 4],
    },
    Destroy {
        window: String,
    },
    HoldMouseMoves,
    ReleaseMouseMoves,
    LockCompositor,
    UnlockCompositor,
    CompositingEnded,
    ResizeHost {
        width: i32,
        height: i32,
    },
}

/// Maps a script key name to a key code; unrecognized names are
/// `KeyCode::Unknown`, which dispatch drops.
pub fn parse_key(name: &str) -> KeyCode {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return KeyCode::Character(c);
    }
    match name.to_ascii_lowercase().as_str() {
        "return" | "enter" => KeyCode::Return,
        "tab" => KeyCode::Tab,
        "escape" | "esc" => KeyCode::Escape,
        "space" => KeyCode::Space,
        "back" | "backspace" => KeyCode::Back,
        "delete" => KeyCode::Delete,
        "left" => KeyCode::Left,
        "up" => KeyCode::Up,
        "right" => KeyCode::Right,
        "down" => KeyCode::Down,
        other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            Some(n) if (1..=24).contains(&n) => KeyCode::Function(n),
            _ => KeyCode::Unknown,
        },
    }
}

pub type ReplayLog = Rc<RefCell<Vec<String>>>;

/// Window delegate that logs every callback under the window's name.
pub struct LoggingDelegate {
    name: String,
    log: ReplayLog,
    can_focus: bool,
    consume_gestures: bool,
}

impl LoggingDelegate {
    pub fn new(name: impl Into<String>, log: ReplayLog) -> Self {
        Self {
            name: name.into(),
            log,
            can_focus: true,
            consume_gestures: false,
        }
    }

    pub fn with_focus(mut self, can_focus: bool) -> Self {
        self.can_focus = can_focus;
        self
    }

    pub fn with_consumed_gestures(mut self, consume: bool) -> Self {
        self.consume_gestures = consume;
        self
    }

    fn record(&self, line: String) {
        debug!("📝 {}", line);
        self.log.borrow_mut().push(line);
    }
}

impl WindowDelegate for LoggingDelegate {
    fn on_key_event(&self, event: &KeyEvent) -> bool {
        self.record(format!("{} {:?} {:?}", self.name, event.event_type, event.key_code));
        true
    }

    fn on_mouse_event(&self, event: &MouseEvent) -> bool {
        let mut line = format!("{} {:?} at {}", self.name, event.event_type, event.location);
        if event.flags.contains(EventFlags::IS_SYNTHESIZED) {
            line.push_str(" (synthesized)");
        }
        self.record(line);
        true
    }

    fn on_touch_event(&self, event: &TouchEvent) -> TouchStatus {
        self.record(format!(
            "{} {:?} #{} at {}",
            self.name, event.event_type, event.touch_id, event.location
        ));
        TouchStatus::Unknown
    }

    fn on_gesture_event(&self, event: &GestureEvent) -> GestureStatus {
        self.record(format!("{} {:?} at {}", self.name, event.event_type, event.location));
        if self.consume_gestures {
            GestureStatus::Consumed
        } else {
            GestureStatus::Unknown
        }
    }

    fn can_focus(&self) -> bool {
        self.can_focus
    }

    fn on_capture_lost(&self) {
        self.record(format!("{} capture lost", self.name));
    }

    fn on_focus(&self) {
        self.record(format!("{} focus", self.name));
    }

    fn on_blur(&self) {
        self.record(format!("{} blur", self.name));
    }

    fn on_window_destroyed(&self) {
        self.record(format!("{} destroyed", self.name));
    }
}

/// Compositor that only logs and counts the frames it is asked for.
#[derive(Debug, Default)]
pub struct LoggingCompositor {
    draws: Cell<u64>,
}

impl LoggingCompositor {
    pub fn draws(&self) -> u64 {
        self.draws.get()
    }
}

impl Compositor for LoggingCompositor {
    fn draw(&self, _force_clear: bool) {
        self.draws.set(self.draws.get() + 1);
        debug!("🎨 Frame {} submitted", self.draws.get());
    }

    fn schedule_full_draw(&self) {
        debug!("🎨 Full redraw requested");
    }

    fn widget_size_changed(&self, size: Size) {
        debug!("📐 Widget size now {}x{}", size.width, size.height);
    }
}

/// Runs scripts against a root window on a manual clock.
pub struct ReplayRunner {
    root_window: RootWindow,
    clock: Rc<ManualClock>,
    compositor: Rc<LoggingCompositor>,
    windows: HashMap<String, WindowId>,
    log: ReplayLog,
    lock: Option<CompositorLock>,
}

impl ReplayRunner {
    pub fn new(config: &AuraConfig) -> Self {
        let clock = Rc::new(ManualClock::new());
        let compositor = Rc::new(LoggingCompositor::default());
        let root_window = RootWindow::new(Env::new(), compositor.clone(), clock.clone(), config);
        let mut windows = HashMap::new();
        windows.insert(ROOT_NAME.to_string(), root_window.root());
        Self {
            root_window,
            clock,
            compositor,
            windows,
            log: Rc::new(RefCell::new(Vec::new())),
            lock: None,
        }
    }

    pub fn root_window(&self) -> &RootWindow {
        &self.root_window
    }

    pub fn root_window_mut(&mut self) -> &mut RootWindow {
        &mut self.root_window
    }

    pub fn window(&self, name: &str) -> Option<WindowId> {
        self.windows.get(name).copied()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn draws(&self) -> u64 {
        self.compositor.draws()
    }

    /// Builds the window tree and replays every step; returns the log.
    pub fn run(&mut self, script: &ReplayScript) -> Result<Vec<String>> {
        info!(
            "▶️ Replaying {} windows and {} steps",
            script.windows.len(),
            script.steps.len()
        );
        for spec in &script.windows {
            self.create(spec)?;
        }
        for (index, step) in script.steps.iter().enumerate() {
            self.step(step).with_context(|| format!("Step {} failed: {:?}", index, step))?;
        }
        Ok(self.log())
    }

    pub fn create(&mut self, spec: &WindowSpec) -> Result<WindowId> {
        if self.windows.contains_key(&spec.name) {
            bail!("Duplicate window name '{}'", spec.name);
        }
        let parent = match &spec.parent {
            Some(name) => self.lookup(name)?,
            None => self.root_window.root(),
        };
        let delegate: Rc<dyn WindowDelegate> = Rc::new(
            LoggingDelegate::new(spec.name.clone(), self.log.clone())
                .with_focus(spec.can_focus)
                .with_consumed_gestures(spec.consume_gestures),
        );

        let window = self.root_window.create_window(Some(delegate));
        let [x, y, width, height] = spec.bounds;
        self.root_window.tree_mut().set_name(window, spec.name.clone())?;
        self.root_window.tree_mut().set_ignore_events(window, spec.ignore_events)?;
        self.root_window.set_bounds(window, Rect::new(x, y, width, height))?;
        self.root_window.add_child(parent, window)?;
        if let Some(owner) = &spec.transient_for {
            let owner = self.lookup(owner)?;
            self.root_window.add_transient_child(owner, window)?;
        }
        if spec.visible {
            self.root_window.show(window)?;
        }

        self.windows.insert(spec.name.clone(), window);
        debug!("Created '{}' as {:?}", spec.name, window);
        Ok(window)
    }

    fn lookup(&self, name: &str) -> Result<WindowId> {
        match self.windows.get(name) {
            Some(&id) if self.root_window.tree().exists(id) => Ok(id),
            Some(_) => bail!("Window '{}' has been destroyed", name),
            None => bail!("Unknown window '{}'", name),
        }
    }

    pub fn step(&mut self, step: &Step) -> Result<()> {
        let rw = &mut self.root_window;
        match step {
            Step::Mouse { action, x, y, buttons } => {
                let event_type = match action {
                    MouseAction::Pressed => EventType::MousePressed,
                    MouseAction::Dragged => EventType::MouseDragged,
                    MouseAction::Released => EventType::MouseReleased,
                    MouseAction::Moved => EventType::MouseMoved,
                };
                let flags = buttons.iter().fold(EventFlags::empty(), |flags, b| {
                    flags
                        | match b {
                            MouseButton::Left => EventFlags::LEFT_MOUSE_BUTTON,
                            MouseButton::Middle => EventFlags::MIDDLE_MOUSE_BUTTON,
                            MouseButton::Right => EventFlags::RIGHT_MOUSE_BUTTON,
                        }
                });
                let event = MouseEvent::at(event_type, Point::new(*x, *y), flags).with_time_stamp(self.clock.elapsed());
                rw.dispatch_mouse_event(&event);
            }
            Step::Scroll { x, y, dx, dy } => {
                let event = MouseEvent::scroll(Point::new(*x, *y), *dx, *dy, EventFlags::empty());
                rw.dispatch_scroll_event(&event);
            }
            Step::Key { key } => {
                rw.dispatch_key_event(&KeyEvent::pressed(parse_key(key)));
            }
            Step::Touch {
                action,
                x,
                y,
                id,
                time_ms,
            } => {
                let event_type = match action {
                    TouchAction::Pressed => EventType::TouchPressed,
                    TouchAction::Moved => EventType::TouchMoved,
                    TouchAction::Released => EventType::TouchReleased,
                    TouchAction::Cancelled => EventType::TouchCancelled,
                };
                let event = TouchEvent::new(event_type, Point::new(*x, *y), *id, Duration::from_millis(*time_ms));
                rw.dispatch_touch_event(&event);
            }
            Step::Advance { ms } => {
                self.clock.advance(Duration::from_millis(*ms));
                rw.run_pending_tasks();
            }
            Step::RunTasks => {
                rw.run_pending_tasks();
            }
            Step::Focus { window } => {
                let target = window.as_deref().map(|w| self.lookup(w)).transpose()?;
                self.root_window.set_focused_window(target, None);
            }
            Step::Capture { window } => {
                let target = self.lookup(window)?;
                self.root_window.set_capture(target);
            }
            Step::ReleaseCapture { window } => {
                let target = self.lookup(window)?;
                self.root_window.release_capture(target);
            }
            Step::Show { window } => {
                let target = self.lookup(window)?;
                self.root_window.show(target)?;
            }
            Step::Hide { window } => {
                let target = self.lookup(window)?;
                self.root_window.hide(target)?;
            }
            Step::SetBounds { window, bounds } => {
                let target = self.lookup(window)?;
                let [x, y, width, height] = *bounds;
                self.root_window.set_bounds(target, Rect::new(x, y, width, height))?;
            }
            Step::Destroy { window } => {
                let target = self.lookup(window)?;
                self.root_window.destroy_window(target)?;
            }
            Step::HoldMouseMoves => rw.hold_mouse_moves(),
            Step::ReleaseMouseMoves => rw.release_mouse_moves(),
            Step::LockCompositor => {
                self.lock = Some(rw.get_compositor_lock());
            }
            Step::UnlockCompositor => {
                if let Some(lock) = self.lock.take() {
                    lock.cancel();
                }
            }
            Step::CompositingEnded => rw.on_compositing_ended(),
            Step::ResizeHost { width, height } => rw.set_host_size(Size::new(*width, *height)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
