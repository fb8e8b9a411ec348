//! # Aura Dispatch
//!
//! Event dispatch and compositor coordination for a layered window tree.
//!
//! ## Architecture
//!
//! - `geometry`: points, rectangles, insets and 2D affine transforms
//! - `event`: mouse, key, touch and gesture events and their flags
//! - `window`: the window arena, hit testing and coordinate conversion
//! - `delegate`: per-window behavior and observer traits
//! - `filter`: event filters owned by ancestor windows
//! - `client`: activation, event and visibility policy plus the shared `Env`
//! - `task`: clocks and the deferred task queue
//! - `compositor`: draw scheduling and compositor locks
//! - `gestures`: touch-to-gesture recognition
//! - `root_window`: the dispatch core tying all of the above together
//! - `config`: TOML configuration
//! - `replay`: JSON scripts replayed against a headless root window
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aura_dispatch::{AuraConfig, Env, EventFlags, EventType, MouseEvent, Point, RootWindow};
//! use aura_dispatch::replay::LoggingCompositor;
//! use std::rc::Rc;
//!
//! let config = AuraConfig::default();
//! let mut root_window =
//!     RootWindow::with_system_clock(Env::new(), Rc::new(LoggingCompositor::default()), &config);
//! let event = MouseEvent::at(EventType::MouseMoved, Point::new(10, 10), EventFlags::empty());
//! root_window.dispatch_mouse_event(&event);
//! root_window.run_pending_tasks();
//! ```

pub mod client;
pub mod compositor;
pub mod config;
pub mod delegate;
pub mod event;
pub mod filter;
pub mod geometry;
pub mod gestures;
pub mod replay;
pub mod root_window;
pub mod task;
pub mod window;

// Re-export main types for easy access
pub use client::{ActivationClient, Env, EventClient, LayerVisibility, VisibilityClient};
pub use compositor::{Compositor, CompositorLock};
pub use config::AuraConfig;
pub use delegate::{RootWindowObserver, WindowDelegate, WindowObserver};
pub use event::{
    Event, EventFlags, EventType, GestureEvent, GestureStatus, HitTestCode, KeyCode, KeyEvent, MouseEvent,
    TouchEvent, TouchStatus,
};
pub use filter::EventFilter;
pub use geometry::{Insets, Point, Rect, Size, Transform};
pub use gestures::GestureRecognizer;
pub use root_window::RootWindow;
pub use task::{Clock, ManualClock, SystemClock, Task};
pub use window::{WindowError, WindowId, WindowTree};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Aura Dispatch
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
