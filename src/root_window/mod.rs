//! The root window: event dispatch and compositor coordination
//!
//! A `RootWindow` owns the window tree and everything that decides where
//! an event goes: the pointer state (last location, buttons, pressed and
//! entered handlers), capture, focus, held mouse moves, the gesture
//! recognizer and the draw scheduler. The host feeds it raw events and
//! pumps its task queue; windows are created and rearranged through it so
//! that dispatch state follows every change to the tree.
//!
//! The implementation is split by concern:
//! - `dispatch`: mouse, scroll, key, touch and gesture routing
//! - `focus`: capture and focus transfer, hidden-window cleanup
//! - `lifecycle`: creating, reparenting, showing, moving and destroying
//! - `draw`: draw requests, compositing notifications and locks

mod dispatch;
mod draw;
mod focus;
mod lifecycle;

use crate::client::{ActivationClient, Env, EventClient, VisibilityClient};
use crate::compositor::{expire_lock, Compositor, DrawScheduler};
use crate::config::AuraConfig;
use crate::delegate::RootWindowObserver;
use crate::event::{EventFlags, MouseEvent};
use crate::gestures::GestureRecognizer;
use crate::geometry::{Point, Rect, Size, Transform};
use crate::task::{Clock, SystemClock, Task, TaskQueue};
use crate::window::{WindowId, WindowTree};
use log::{debug, info, trace, warn};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Top of a window tree and the single entry point for host input.
pub struct RootWindow {
    tree: WindowTree,
    root: WindowId,
    env: Rc<Env>,
    host_bounds: Rect,
    should_hold_mouse_moves: bool,

    tasks: Rc<RefCell<TaskQueue>>,
    scheduler: Rc<RefCell<DrawScheduler>>,
    gesture_recognizer: GestureRecognizer,

    activation_client: Option<Rc<dyn ActivationClient>>,
    event_client: Option<Rc<dyn EventClient>>,
    visibility_client: Option<Rc<dyn VisibilityClient>>,
    observers: Vec<Rc<dyn RootWindowObserver>>,

    // Pointer and dispatch state, all in root coordinates.
    last_mouse_location: Point,
    mouse_button_flags: EventFlags,
    capture_window: Option<WindowId>,
    mouse_pressed_handler: Option<WindowId>,
    mouse_moved_handler: Option<WindowId>,
    focused_window: Option<WindowId>,

    held_mouse_move: Option<MouseEvent>,
    mouse_move_hold_count: u32,
    synthesize_mouse_move: bool,

    /// Reused by every dispatch to collect filter owners.
    filter_scratch: Vec<WindowId>,
}

impl RootWindow {
    /// Creates a root window sized to the configured host, drawing through
    /// `compositor` and timing deferred work with `clock`.
    pub fn new(env: Rc<Env>, compositor: Rc<dyn Compositor>, clock: Rc<dyn Clock>, config: &AuraConfig) -> Self {
        let host_bounds = Rect::new(0, 0, config.root_window.width, config.root_window.height);
        let tasks = Rc::new(RefCell::new(TaskQueue::new(clock)));
        let scheduler = Rc::new(RefCell::new(DrawScheduler::new(
            compositor,
            tasks.clone(),
            config.root_window.compositor_lock_timeout(),
        )));

        let mut tree = WindowTree::new();
        let root = tree.create(None);
        let _ = tree.set_name(root, "RootWindow");
        let _ = tree.set_bounds_raw(root, Rect::from_size(host_bounds.size()));
        let _ = tree.set_visible_raw(root, true);
        let _ = tree.set_layer_visible_raw(root, true);
        env.notify_window_initialized(root);

        info!(
            "🪟 Root window created at {}x{}",
            host_bounds.width, host_bounds.height
        );

        Self {
            tree,
            root,
            env,
            host_bounds,
            should_hold_mouse_moves: config.root_window.hold_mouse_moves,
            tasks,
            scheduler,
            gesture_recognizer: GestureRecognizer::new(config.gestures.clone()),
            activation_client: None,
            event_client: None,
            visibility_client: None,
            observers: Vec::new(),
            last_mouse_location: Point::default(),
            mouse_button_flags: EventFlags::empty(),
            capture_window: None,
            mouse_pressed_handler: None,
            mouse_moved_handler: None,
            focused_window: None,
            held_mouse_move: None,
            mouse_move_hold_count: 0,
            synthesize_mouse_move: false,
            filter_scratch: Vec::new(),
        }
    }

    /// Same as [`RootWindow::new`] on wall-clock time.
    pub fn with_system_clock(env: Rc<Env>, compositor: Rc<dyn Compositor>, config: &AuraConfig) -> Self {
        Self::new(env, compositor, Rc::new(SystemClock), config)
    }

    pub fn root(&self) -> WindowId {
        self.root
    }

    pub fn tree(&self) -> &WindowTree {
        &self.tree
    }

    /// Mutable access for changes that do not affect dispatch state:
    /// names, ids, hit-test overrides, filters, observers, properties,
    /// stacking and transient relations.
    pub fn tree_mut(&mut self) -> &mut WindowTree {
        &mut self.tree
    }

    pub fn env(&self) -> &Rc<Env> {
        &self.env
    }

    pub fn tasks(&self) -> &Rc<RefCell<TaskQueue>> {
        &self.tasks
    }

    pub fn draw_scheduler(&self) -> Ref<'_, DrawScheduler> {
        self.scheduler.borrow()
    }

    pub fn gesture_recognizer(&self) -> &GestureRecognizer {
        &self.gesture_recognizer
    }

    // Clients

    pub fn set_activation_client(&mut self, client: Option<Rc<dyn ActivationClient>>) {
        self.activation_client = client;
    }

    pub fn set_event_client(&mut self, client: Option<Rc<dyn EventClient>>) {
        self.event_client = client;
    }

    pub fn set_visibility_client(&mut self, client: Option<Rc<dyn VisibilityClient>>) {
        self.visibility_client = client;
    }

    // Observers

    pub fn add_root_window_observer(&mut self, observer: Rc<dyn RootWindowObserver>) {
        self.observers.push(observer);
    }

    pub fn remove_root_window_observer(&mut self, observer: &Rc<dyn RootWindowObserver>) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    fn notify_root_observers(&self, f: impl Fn(&dyn RootWindowObserver)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }

    // Pointer state

    /// Last pointer location seen by mouse or scroll dispatch, in root
    /// coordinates.
    pub fn last_mouse_location(&self) -> Point {
        self.last_mouse_location
    }

    pub fn mouse_button_flags(&self) -> EventFlags {
        self.mouse_button_flags
    }

    pub fn mouse_pressed_handler(&self) -> Option<WindowId> {
        self.live(self.mouse_pressed_handler)
    }

    pub fn mouse_moved_handler(&self) -> Option<WindowId> {
        self.live(self.mouse_moved_handler)
    }

    pub fn has_held_mouse_move(&self) -> bool {
        self.held_mouse_move.is_some()
    }

    pub fn is_mouse_move_synthesis_pending(&self) -> bool {
        self.synthesize_mouse_move
    }

    /// Starts coalescing dragged and synthesized mouse moves.
    pub fn hold_mouse_moves(&mut self) {
        if self.should_hold_mouse_moves {
            self.mouse_move_hold_count += 1;
            trace!("Mouse move hold count {}", self.mouse_move_hold_count);
        }
    }

    /// Ends one hold; the last release dispatches the held move.
    pub fn release_mouse_moves(&mut self) {
        if !self.should_hold_mouse_moves {
            return;
        }
        if self.mouse_move_hold_count == 0 {
            warn!("release_mouse_moves called without a matching hold");
            return;
        }
        self.mouse_move_hold_count -= 1;
        if self.mouse_move_hold_count == 0 {
            self.dispatch_held_mouse_move();
        }
    }

    // Host geometry

    pub fn host_bounds(&self) -> Rect {
        self.host_bounds
    }

    pub fn host_size(&self) -> Size {
        self.host_bounds.size()
    }

    pub fn set_host_size(&mut self, size: Size) {
        self.dispatch_held_mouse_move();
        self.host_bounds = self.host_bounds.with_size(size);
        self.on_host_resized(size);
        self.synthesize_mouse_move = false;
    }

    pub fn set_host_bounds(&mut self, bounds: Rect) {
        self.dispatch_held_mouse_move();
        self.host_bounds = bounds;
        self.on_host_resized(bounds.size());
        self.synthesize_mouse_move = false;
    }

    /// The host's monitor layout changed; the host now covers `bounds`.
    pub fn on_native_monitor_configuration_changed(&mut self, bounds: Rect) {
        info!("🖥️ Monitor configuration changed, host now {}", bounds);
        self.set_host_bounds(bounds);
    }

    /// Resizes the root to the host size as seen through the root
    /// transform and tells the compositor and root observers.
    pub fn on_host_resized(&mut self, size: Size) {
        self.dispatch_held_mouse_move();
        let compositor = self.scheduler.borrow().compositor().clone();
        compositor.widget_size_changed(size);

        let old_size = self.tree.get(self.root).map(|w| w.bounds().size()).unwrap_or_default();
        let transformed = self.root_transform().transform_rect(&Rect::from_size(size));
        self.set_bounds_internal(self.root, Rect::from_size(transformed.size()));
        debug!("Root window resized from {:?} to {:?}", old_size, transformed.size());

        self.notify_root_observers(|o| o.on_root_window_resized(old_size));
    }

    pub fn root_transform(&self) -> Transform {
        self.tree.get(self.root).map(|w| *w.transform()).unwrap_or_default()
    }

    /// Applies a transform to the whole root (rotation, scaling) and
    /// recomputes the root bounds from the host size.
    pub fn set_root_transform(&mut self, transform: Transform) {
        let _ = self.tree.set_transform_raw(self.root, transform);
        self.on_host_resized(self.host_bounds.size());
    }

    // Deferred work

    /// Runs every task whose deadline has passed and returns how many ran.
    ///
    /// Tasks posted while running wait for the next call.
    pub fn run_pending_tasks(&mut self) -> usize {
        let due = self.tasks.borrow_mut().take_due();
        let count = due.len();
        for task in due {
            trace!("Running {:?}", task);
            match task {
                Task::Draw => self.scheduler.borrow_mut().draw(),
                Task::SynthesizeMouseMove => self.synthesize_mouse_move_event(),
                Task::CancelCompositorLock { lock_id } => expire_lock(&self.scheduler, lock_id),
                Task::LongPress { window, token } => self.fire_long_press(window, token),
            }
        }
        count
    }

    fn post_mouse_move_event_after_window_change(&mut self) {
        if self.synthesize_mouse_move {
            return;
        }
        self.synthesize_mouse_move = true;
        self.tasks.borrow_mut().post(Task::SynthesizeMouseMove);
    }

    // Helpers shared by the submodules

    /// `window` if it still resolves.
    fn live(&self, window: Option<WindowId>) -> Option<WindowId> {
        window.filter(|&w| self.tree.exists(w))
    }

    fn is_in_root(&self, window: WindowId) -> bool {
        self.tree.root_of(window) == Some(self.root)
    }

    /// Visible and under the last known pointer location.
    fn contains_mouse(&self, window: WindowId) -> bool {
        self.tree.is_visible(window) && self.tree.contains_point_in_root(window, self.last_mouse_location)
    }
}

impl Drop for RootWindow {
    fn drop(&mut self) {
        // Outstanding lock tokens must not schedule draws on a dead root.
        if let Ok(mut scheduler) = self.scheduler.try_borrow_mut() {
            scheduler.abandon_lock();
        }
        if let Ok(mut tasks) = self.tasks.try_borrow_mut() {
            tasks.clear();
        }
        debug!("Root window destroyed");
    }
}

impl fmt::Debug for RootWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootWindow")
            .field("root", &self.root)
            .field("host_bounds", &self.host_bounds)
            .field("windows", &self.tree.len())
            .field("capture_window", &self.capture_window)
            .field("focused_window", &self.focused_window)
            .field("mouse_pressed_handler", &self.mouse_pressed_handler)
            .field("mouse_moved_handler", &self.mouse_moved_handler)
            .field("last_mouse_location", &self.last_mouse_location)
            .field("mouse_move_hold_count", &self.mouse_move_hold_count)
            .finish()
    }
}
