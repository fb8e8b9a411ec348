//! Window tree storage, geometry and hit-testing
//!
//! Windows live in a generational arena and refer to each other by
//! [`WindowId`]. A handle whose window has been destroyed simply stops
//! resolving, so the root window's capture, focus and handler references
//! can never dangle.
//!
//! This module owns the structural state of the tree: parent/child and
//! transient relations, bounds, transforms, visibility, hit-test overrides
//! and properties. Operations that also affect dispatch state (showing,
//! hiding, destroying, reparenting) go through `RootWindow`, which calls the
//! crate-private mutators here and then reacts to the change.

pub mod property;

use crate::client::EventClient;
use crate::delegate::{WindowDelegate, WindowObserver};
use crate::filter::EventFilter;
use crate::geometry::{Insets, Point, Rect, Transform};
use log::{debug, trace};
use slotmap::SlotMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

pub use property::{PropertyMap, WindowProperty};

slotmap::new_key_type! {
    /// Stable handle to a window in a [`WindowTree`].
    pub struct WindowId;
}

/// Misuse of the tree structure by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window {0:?} does not exist")]
    NotFound(WindowId),

    #[error("window {child:?} is not a child of {parent:?}")]
    NotAChild { parent: WindowId, child: WindowId },

    #[error("window {child:?} is already a child of {parent:?}")]
    AlreadyAChild { parent: WindowId, child: WindowId },

    #[error("adding {child:?} under {parent:?} would make it its own ancestor")]
    Cycle { parent: WindowId, child: WindowId },

    #[error("window {0:?} cannot be stacked relative to itself")]
    StackOnSelf(WindowId),

    #[error("window {child:?} is not a transient child of {parent:?}")]
    NotATransientChild { parent: WindowId, child: WindowId },

    #[error("window {0:?} is the root window")]
    IsRoot(WindowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackDirection {
    Above,
    Below,
}

/// A node in the window tree.
pub struct Window {
    id: i32,
    name: String,
    parent: Option<WindowId>,
    /// Bottom-most first; the last child is painted and hit-tested on top.
    children: Vec<WindowId>,
    transient_parent: Option<WindowId>,
    transient_children: Vec<WindowId>,
    bounds: Rect,
    transform: Transform,
    visible: bool,
    layer_visible: bool,
    closing: bool,
    ignore_events: bool,
    hit_test_outer: Insets,
    hit_test_inner: Insets,
    delegate: Option<Rc<dyn WindowDelegate>>,
    event_filter: Option<Box<dyn EventFilter>>,
    observers: Vec<Rc<dyn WindowObserver>>,
    properties: PropertyMap,
}

impl Window {
    fn new(delegate: Option<Rc<dyn WindowDelegate>>) -> Self {
        Self {
            id: -1,
            name: String::new(),
            parent: None,
            children: Vec::new(),
            transient_parent: None,
            transient_children: Vec::new(),
            bounds: Rect::default(),
            transform: Transform::identity(),
            visible: false,
            layer_visible: false,
            closing: false,
            ignore_events: false,
            hit_test_outer: Insets::default(),
            hit_test_inner: Insets::default(),
            delegate,
            event_filter: None,
            observers: Vec::new(),
            properties: PropertyMap::default(),
        }
    }

    /// Caller-assigned id; not guaranteed unique.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    pub fn children(&self) -> &[WindowId] {
        &self.children
    }

    pub fn transient_parent(&self) -> Option<WindowId> {
        self.transient_parent
    }

    pub fn transient_children(&self) -> &[WindowId] {
        &self.transient_children
    }

    /// Bounds in the parent's coordinate space.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The window's own visibility flag, ignoring layers and ancestors.
    pub fn target_visibility(&self) -> bool {
        self.visible
    }

    pub fn layer_visible(&self) -> bool {
        self.layer_visible
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn ignore_events(&self) -> bool {
        self.ignore_events
    }

    pub fn hit_test_bounds_override_outer(&self) -> Insets {
        self.hit_test_outer
    }

    pub fn hit_test_bounds_override_inner(&self) -> Insets {
        self.hit_test_inner
    }

    pub fn delegate(&self) -> Option<&Rc<dyn WindowDelegate>> {
        self.delegate.as_ref()
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    pub fn has_event_filter(&self) -> bool {
        self.event_filter.is_some()
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Maps this window's local coordinates into its parent's.
    fn transform_to_parent(&self) -> Transform {
        self.transform.then(&Transform::translation(
            self.bounds.x as f64,
            self.bounds.y as f64,
        ))
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_size(self.bounds.size())
    }

    fn contains_local_point(&self, local_point: Point) -> bool {
        self.local_bounds().contains(local_point)
    }

    /// Local bounds expanded (or shrunk) by the outer hit-test override.
    fn hit_test(&self, local_point: Point) -> bool {
        self.local_bounds().inset(&self.hit_test_outer).contains(local_point)
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("bounds", &self.bounds)
            .field("visible", &self.visible)
            .field("layer_visible", &self.layer_visible)
            .field("closing", &self.closing)
            .field("ignore_events", &self.ignore_events)
            .field("has_delegate", &self.delegate.is_some())
            .field("has_event_filter", &self.event_filter.is_some())
            .finish()
    }
}

/// Arena holding every window of one root window's tree, attached or not.
#[derive(Default)]
pub struct WindowTree {
    windows: SlotMap<WindowId, Window>,
}

impl WindowTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached, hidden window.
    pub(crate) fn create(&mut self, delegate: Option<Rc<dyn WindowDelegate>>) -> WindowId {
        let id = self.windows.insert(Window::new(delegate));
        trace!("Created window {:?}", id);
        id
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn exists(&self, id: WindowId) -> bool {
        self.windows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn window(&self, id: WindowId) -> Result<&Window, WindowError> {
        self.windows.get(id).ok_or(WindowError::NotFound(id))
    }

    fn window_mut(&mut self, id: WindowId) -> Result<&mut Window, WindowError> {
        self.windows.get_mut(id).ok_or(WindowError::NotFound(id))
    }

    pub fn delegate(&self, id: WindowId) -> Option<Rc<dyn WindowDelegate>> {
        self.get(id).and_then(|w| w.delegate.clone())
    }

    pub fn parent(&self, id: WindowId) -> Option<WindowId> {
        self.get(id).and_then(|w| w.parent)
    }

    // Simple attribute setters. None of these affect dispatch state.

    pub fn set_id(&mut self, window: WindowId, id: i32) -> Result<(), WindowError> {
        self.window_mut(window)?.id = id;
        Ok(())
    }

    pub fn set_name(&mut self, window: WindowId, name: impl Into<String>) -> Result<(), WindowError> {
        self.window_mut(window)?.name = name.into();
        Ok(())
    }

    pub fn set_ignore_events(&mut self, window: WindowId, ignore: bool) -> Result<(), WindowError> {
        self.window_mut(window)?.ignore_events = ignore;
        Ok(())
    }

    /// Negative insets let a window accept events outside its bounds.
    pub fn set_hit_test_bounds_override_outer(&mut self, window: WindowId, insets: Insets) -> Result<(), WindowError> {
        self.window_mut(window)?.hit_test_outer = insets;
        Ok(())
    }

    /// Points inside these insets are claimed by the window itself rather
    /// than any child covering them.
    pub fn set_hit_test_bounds_override_inner(&mut self, window: WindowId, insets: Insets) -> Result<(), WindowError> {
        self.window_mut(window)?.hit_test_inner = insets;
        Ok(())
    }

    pub fn set_closing(&mut self, window: WindowId, closing: bool) -> Result<(), WindowError> {
        self.window_mut(window)?.closing = closing;
        Ok(())
    }

    pub fn set_event_filter(
        &mut self,
        window: WindowId,
        filter: Option<Box<dyn EventFilter>>,
    ) -> Result<Option<Box<dyn EventFilter>>, WindowError> {
        let w = self.window_mut(window)?;
        Ok(std::mem::replace(&mut w.event_filter, filter))
    }

    /// Lends a window's filter out while it is being called.
    pub(crate) fn take_event_filter(&mut self, window: WindowId) -> Option<Box<dyn EventFilter>> {
        self.windows.get_mut(window).and_then(|w| w.event_filter.take())
    }

    pub(crate) fn restore_event_filter(&mut self, window: WindowId, filter: Box<dyn EventFilter>) {
        if let Some(w) = self.windows.get_mut(window) {
            if w.event_filter.is_none() {
                w.event_filter = Some(filter);
            }
        }
    }

    pub fn add_observer(&mut self, window: WindowId, observer: Rc<dyn WindowObserver>) -> Result<(), WindowError> {
        self.window_mut(window)?.observers.push(observer);
        Ok(())
    }

    pub fn remove_observer(&mut self, window: WindowId, observer: &Rc<dyn WindowObserver>) -> Result<(), WindowError> {
        self.window_mut(window)?.observers.retain(|o| !Rc::ptr_eq(o, observer));
        Ok(())
    }

    pub fn has_observer(&self, window: WindowId, observer: &Rc<dyn WindowObserver>) -> bool {
        self.get(window)
            .map(|w| w.observers.iter().any(|o| Rc::ptr_eq(o, observer)))
            .unwrap_or(false)
    }

    pub(crate) fn notify_observers(&self, window: WindowId, f: impl Fn(&dyn WindowObserver)) {
        if let Some(w) = self.get(window) {
            for observer in &w.observers {
                f(observer.as_ref());
            }
        }
    }

    // Properties

    pub fn property<T: 'static>(&self, window: WindowId, key: &WindowProperty<T>) -> Option<&T> {
        self.get(window).and_then(|w| w.properties.get(key))
    }

    /// Sets a property and tells the window's observers; returns the old value.
    pub fn set_property<T: 'static>(
        &mut self,
        window: WindowId,
        key: &WindowProperty<T>,
        value: T,
    ) -> Result<Option<T>, WindowError> {
        let old = self.window_mut(window)?.properties.set(key, value);
        self.notify_observers(window, |o| o.on_window_property_changed(window, key.name()));
        Ok(old)
    }

    pub fn clear_property<T: 'static>(
        &mut self,
        window: WindowId,
        key: &WindowProperty<T>,
    ) -> Result<Option<T>, WindowError> {
        let old = self.window_mut(window)?.properties.clear(key);
        if old.is_some() {
            self.notify_observers(window, |o| o.on_window_property_changed(window, key.name()));
        }
        Ok(old)
    }

    // Tree relations

    /// True when `other` is `ancestor` or lies somewhere beneath it.
    pub fn contains(&self, ancestor: WindowId, other: Option<WindowId>) -> bool {
        let mut current = other;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// The top of the tree `window` belongs to.
    pub fn root_of(&self, window: WindowId) -> Option<WindowId> {
        let mut current = self.get(window).map(|_| window)?;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// The outermost ancestor (or the window itself) that has a delegate.
    pub fn toplevel_window(&self, window: WindowId) -> Option<WindowId> {
        let mut topmost = None;
        let mut current = Some(window);
        while let Some(id) = current {
            let Some(w) = self.get(id) else {
                break;
            };
            if w.delegate.is_some() {
                topmost = Some(id);
            }
            current = w.parent;
        }
        topmost
    }

    /// Depth-first search of the descendants of `window` by caller id.
    pub fn get_child_by_id(&self, window: WindowId, id: i32) -> Option<WindowId> {
        let w = self.get(window)?;
        for &child in &w.children {
            if self.get(child).map(|c| c.id) == Some(id) {
                return Some(child);
            }
            if let Some(found) = self.get_child_by_id(child, id) {
                return Some(found);
            }
        }
        None
    }

    /// Windows in the subtree of `window`, parents before children.
    pub fn descendants(&self, window: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        let mut stack = vec![window];
        while let Some(id) = stack.pop() {
            let Some(w) = self.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(w.children.iter().rev().copied());
        }
        out
    }

    /// Appends `child` to `parent`'s children, on top of its siblings.
    ///
    /// The child must already be detached.
    pub(crate) fn attach(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.window(parent)?;
        let c = self.window(child)?;
        if let Some(existing) = c.parent {
            return Err(WindowError::AlreadyAChild { parent: existing, child });
        }
        if self.contains(child, Some(parent)) {
            return Err(WindowError::Cycle { parent, child });
        }
        self.window_mut(child)?.parent = Some(parent);
        self.window_mut(parent)?.children.push(child);
        debug!("Added window {:?} to {:?}", child, parent);
        self.notify_observers(parent, |o| o.on_window_added(child));
        self.notify_observers(child, |o| o.on_window_parent_changed(child, Some(parent)));
        Ok(())
    }

    /// Fails unless `child` is currently a child of `parent`.
    pub(crate) fn check_child(&self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        if self.window(child)?.parent == Some(parent) && self.window(parent)?.children.contains(&child) {
            Ok(())
        } else {
            Err(WindowError::NotAChild { parent, child })
        }
    }

    /// Unlinks `child` from `parent`. Callers fire the will-remove
    /// notifications first.
    pub(crate) fn detach(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.check_child(parent, child)?;
        self.window_mut(parent)?.children.retain(|&c| c != child);
        self.window_mut(child)?.parent = None;
        debug!("Removed window {:?} from {:?}", child, parent);
        self.notify_observers(child, |o| o.on_window_parent_changed(child, None));
        Ok(())
    }

    pub fn add_transient_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        self.window(parent)?;
        self.window(child)?;
        // `child` may not already own `parent`, directly or transitively.
        let mut owner = Some(parent);
        while let Some(w) = owner {
            if w == child {
                return Err(WindowError::Cycle { parent, child });
            }
            owner = self.get(w).and_then(|w| w.transient_parent);
        }
        if let Some(old) = self.window(child)?.transient_parent {
            self.remove_transient_child(old, child)?;
        }
        self.window_mut(parent)?.transient_children.push(child);
        self.window_mut(child)?.transient_parent = Some(parent);
        Ok(())
    }

    pub fn remove_transient_child(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        let p = self.window_mut(parent)?;
        let Some(index) = p.transient_children.iter().position(|&c| c == child) else {
            return Err(WindowError::NotATransientChild { parent, child });
        };
        p.transient_children.remove(index);
        if let Some(c) = self.windows.get_mut(child) {
            if c.transient_parent == Some(parent) {
                c.transient_parent = None;
            }
        }
        Ok(())
    }

    /// Drops the record of a window that has already been detached and
    /// emptied of children.
    pub(crate) fn remove(&mut self, window: WindowId) -> Option<Window> {
        self.windows.remove(window)
    }

    // Stacking

    pub fn stack_child_at_top(&mut self, parent: WindowId, child: WindowId) -> Result<(), WindowError> {
        let top = self.window(parent)?.children.last().copied();
        match top {
            Some(top) if top != child => self.stack_child_relative_to(parent, child, top, StackDirection::Above),
            Some(_) => Ok(()),
            None => Err(WindowError::NotAChild { parent, child }),
        }
    }

    pub fn stack_child_above(&mut self, parent: WindowId, child: WindowId, target: WindowId) -> Result<(), WindowError> {
        self.stack_child_relative_to(parent, child, target, StackDirection::Above)
    }

    pub fn stack_child_below(&mut self, parent: WindowId, child: WindowId, target: WindowId) -> Result<(), WindowError> {
        self.stack_child_relative_to(parent, child, target, StackDirection::Below)
    }

    /// Restacks `child` next to `target`, bringing its transient children
    /// along directly above it.
    ///
    /// Closing windows are never used as a target: the search walks down
    /// the stack to the nearest sibling that is not closing, and nothing
    /// moves if there is none.
    pub fn stack_child_relative_to(
        &mut self,
        parent: WindowId,
        child: WindowId,
        target: WindowId,
        direction: StackDirection,
    ) -> Result<(), WindowError> {
        if child == target {
            return Err(WindowError::StackOnSelf(child));
        }
        self.check_child(parent, child)?;
        self.check_child(parent, target)?;

        let children = &self.window(parent)?.children;
        let Some(mut final_index) = children.iter().position(|&c| c == target) else {
            return Err(WindowError::NotAChild { parent, child: target });
        };
        while final_index > 0 && self.is_closing(children[final_index]) {
            final_index -= 1;
        }
        let final_target = children[final_index];
        if self.is_closing(final_target) {
            trace!("No stacking target for {:?}; every candidate is closing", child);
            return Ok(());
        }
        if final_target == child {
            return Ok(());
        }
        self.stack_child_relative_to_impl(parent, child, final_target, direction)
    }

    fn is_closing(&self, window: WindowId) -> bool {
        self.get(window).map(|w| w.closing).unwrap_or(false)
    }

    fn stack_child_relative_to_impl(
        &mut self,
        parent: WindowId,
        child: WindowId,
        target: WindowId,
        direction: StackDirection,
    ) -> Result<(), WindowError> {
        let children = &mut self.window_mut(parent)?.children;
        let (Some(child_i), Some(target_i)) = (
            children.iter().position(|&c| c == child),
            children.iter().position(|&c| c == target),
        ) else {
            return Err(WindowError::NotAChild { parent, child });
        };

        let in_place = match direction {
            StackDirection::Above => child_i == target_i + 1,
            StackDirection::Below => child_i + 1 == target_i,
        };
        if in_place {
            return Ok(());
        }

        let dest_i = match direction {
            StackDirection::Above if child_i < target_i => target_i,
            StackDirection::Above => target_i + 1,
            StackDirection::Below if child_i < target_i => target_i - 1,
            StackDirection::Below => target_i,
        };
        children.remove(child_i);
        children.insert(dest_i, child);

        let transients = self.window(child)?.transient_children.clone();
        let mut last_transient = child;
        for transient in transients {
            if self.parent(transient) == Some(parent) {
                self.stack_child_relative_to_impl(parent, transient, last_transient, StackDirection::Above)?;
                last_transient = transient;
            }
        }

        self.notify_observers(child, |o| o.on_window_stacking_changed(child));
        Ok(())
    }

    // Geometry and visibility

    pub(crate) fn set_bounds_raw(&mut self, window: WindowId, bounds: Rect) -> Result<Rect, WindowError> {
        let w = self.window_mut(window)?;
        Ok(std::mem::replace(&mut w.bounds, bounds))
    }

    pub(crate) fn set_transform_raw(&mut self, window: WindowId, transform: Transform) -> Result<(), WindowError> {
        self.window_mut(window)?.transform = transform;
        Ok(())
    }

    pub(crate) fn set_visible_raw(&mut self, window: WindowId, visible: bool) -> Result<(), WindowError> {
        self.window_mut(window)?.visible = visible;
        Ok(())
    }

    pub(crate) fn set_layer_visible_raw(&mut self, window: WindowId, visible: bool) -> Result<(), WindowError> {
        self.window_mut(window)?.layer_visible = visible;
        Ok(())
    }

    /// Visible means the window's own flag is set and its layer, and the
    /// layer of every ancestor, is drawn.
    pub fn is_visible(&self, window: WindowId) -> bool {
        let Some(w) = self.get(window) else {
            return false;
        };
        if !w.visible {
            return false;
        }
        let mut current = Some(window);
        while let Some(id) = current {
            match self.get(id) {
                Some(w) if w.layer_visible => current = w.parent,
                _ => return false,
            }
        }
        true
    }

    /// Transform from `window`'s coordinates to those of `ancestor`.
    fn transform_to_ancestor(&self, window: WindowId, ancestor: WindowId) -> Option<Transform> {
        let mut transform = Transform::identity();
        let mut current = window;
        while current != ancestor {
            let w = self.get(current)?;
            transform = transform.then(&w.transform_to_parent());
            current = w.parent?;
        }
        Some(transform)
    }

    fn common_ancestor(&self, a: WindowId, b: WindowId) -> Option<WindowId> {
        let mut ancestors = Vec::new();
        let mut current = Some(a);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.parent(id);
        }
        let mut current = Some(b);
        while let Some(id) = current {
            if ancestors.contains(&id) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Converts `point` from `source`'s coordinates into `target`'s.
    ///
    /// A `None` source leaves the point untouched. Returns `None` when the
    /// windows are in different trees or a transform on the way down cannot
    /// be inverted.
    pub fn convert_point(&self, source: Option<WindowId>, target: WindowId, point: Point) -> Option<Point> {
        let Some(source) = source else {
            return Some(point);
        };
        if source == target {
            return Some(point);
        }
        let common = self.common_ancestor(source, target)?;
        let up = self.transform_to_ancestor(source, common)?;
        let down = self.transform_to_ancestor(target, common)?;
        let in_common = up.transform_point(point);
        if down.is_identity() {
            Some(in_common)
        } else {
            down.transform_point_reverse(in_common)
        }
    }

    /// Whether `point_in_root` lands in `window`'s hit-test area.
    pub fn contains_point_in_root(&self, window: WindowId, point_in_root: Point) -> bool {
        let Some(root) = self.root_of(window) else {
            return false;
        };
        let Some(w) = self.get(window) else {
            return false;
        };
        self.convert_point(Some(root), window, point_in_root)
            .map(|local| w.hit_test(local))
            .unwrap_or(false)
    }

    /// Bounds of `window` in the coordinates of its tree's root.
    pub fn screen_bounds(&self, window: WindowId) -> Option<Rect> {
        let w = self.get(window)?;
        let root = self.root_of(window)?;
        let origin = self.convert_point(w.parent, root, w.bounds.origin())?;
        Some(Rect::from_origin_and_size(origin, w.bounds.size()))
    }

    /// The deepest window with a delegate that should receive an event at
    /// `local_point`, given in `window`'s coordinates.
    pub fn get_event_handler_for_point(
        &self,
        window: WindowId,
        local_point: Point,
        event_client: Option<&dyn EventClient>,
    ) -> Option<WindowId> {
        self.window_for_point(window, local_point, true, true, event_client)
    }

    /// The outermost window with a delegate whose bounds contain the point.
    pub fn get_top_window_containing_point(&self, window: WindowId, local_point: Point) -> Option<WindowId> {
        self.window_for_point(window, local_point, false, false, None)
    }

    fn window_for_point(
        &self,
        window: WindowId,
        local_point: Point,
        return_tightest: bool,
        for_event_handling: bool,
        event_client: Option<&dyn EventClient>,
    ) -> Option<WindowId> {
        if !self.is_visible(window) {
            return None;
        }
        let w = self.get(window)?;
        let inside = if for_event_handling {
            w.hit_test(local_point)
        } else {
            w.contains_local_point(local_point)
        };
        if !inside {
            return None;
        }
        let claim_self = || {
            if w.delegate.is_some() && !(for_event_handling && w.ignore_events) {
                Some(window)
            } else {
                None
            }
        };

        if for_event_handling && !w.hit_test_inner.is_empty() {
            let inner = w.local_bounds().inset(&w.hit_test_inner);
            if !inner.contains(local_point) {
                return claim_self();
            }
        }

        if !return_tightest && w.delegate.is_some() {
            return Some(window);
        }

        for &child in w.children.iter().rev() {
            if for_event_handling {
                if let Some(client) = event_client {
                    if !client.can_process_events_within_subtree(self, child) {
                        continue;
                    }
                }
            }
            if !self.is_visible(child) {
                continue;
            }
            let Some(c) = self.get(child) else {
                continue;
            };
            let Some(child_point) = c.transform_to_parent().transform_point_reverse(local_point) else {
                continue;
            };
            if let Some(found) =
                self.window_for_point(child, child_point, return_tightest, for_event_handling, event_client)
            {
                return Some(found);
            }
        }

        claim_self()
    }
}

impl fmt::Debug for WindowTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.windows.iter()).finish()
    }
}
