//! Policy collaborators and the shared environment
//!
//! The root window asks these clients before it changes focus, routes
//! events into a subtree or flips a window's layer visibility. A shell
//! installs them to implement activation rules, modal lock screens and
//! hide animations without the dispatch core knowing about any of it.

use crate::event::{Event, EventFlags};
use crate::window::{WindowId, WindowTree};
use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Veto over focus changes.
pub trait ActivationClient {
    /// Returning `false` aborts the focus change with no side effects.
    fn on_will_focus_window(&self, tree: &WindowTree, window: WindowId, event: Option<&Event>) -> bool;
}

/// Restricts which subtrees may receive events at a given time.
pub trait EventClient {
    fn can_process_events_within_subtree(&self, tree: &WindowTree, window: WindowId) -> bool;
}

/// What a visibility client did with a layer visibility request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerVisibility {
    /// Apply the new visibility to the layer right away.
    Immediate,
    /// The client animates the change and reports back through
    /// `RootWindow::set_layer_visibility`.
    Deferred,
    /// The layer keeps its content on screen while the window goes away;
    /// the window is marked closing and is never used as a stacking target.
    Abandoned,
}

/// Called instead of touching a window's layer visibility directly.
pub trait VisibilityClient {
    fn update_layer_visibility(&self, tree: &WindowTree, window: WindowId, visible: bool) -> LayerVisibility;
}

pub trait EnvObserver {
    fn on_window_initialized(&self, _window: WindowId) {}
}

/// Process-wide state shared by every root window on the UI thread.
///
/// Created once by the host and handed to each `RootWindow`; there is no
/// global accessor.
#[derive(Default)]
pub struct Env {
    mouse_button_flags: Cell<EventFlags>,
    observers: RefCell<Vec<Rc<dyn EnvObserver>>>,
}

impl Env {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Mouse buttons currently held, as last seen by any root window.
    pub fn mouse_button_flags(&self) -> EventFlags {
        self.mouse_button_flags.get()
    }

    pub fn set_mouse_button_flags(&self, flags: EventFlags) {
        self.mouse_button_flags.set(flags.buttons());
    }

    pub fn is_mouse_button_down(&self) -> bool {
        !self.mouse_button_flags.get().is_empty()
    }

    pub fn add_observer(&self, observer: Rc<dyn EnvObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    pub fn remove_observer(&self, observer: &Rc<dyn EnvObserver>) {
        self.observers.borrow_mut().retain(|o| !Rc::ptr_eq(o, observer));
    }

    pub(crate) fn notify_window_initialized(&self, window: WindowId) {
        debug!("Window {:?} initialized", window);
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer.on_window_initialized(window);
        }
    }
}
