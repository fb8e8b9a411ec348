//! Typed per-window property bag
//!
//! Properties are keyed by a static name and carry their value type in the
//! key, so `get` never needs a cast at the call site. Values are owned by the
//! bag and dropped with the window.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Key for a property of type `T`. Names must be unique across types.
pub struct WindowProperty<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> WindowProperty<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for WindowProperty<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WindowProperty<T> {}

impl<T> fmt::Debug for WindowProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WindowProperty").field(&self.name).finish()
    }
}

#[derive(Default)]
pub struct PropertyMap {
    values: HashMap<&'static str, Box<dyn Any>>,
}

impl PropertyMap {
    pub fn get<T: 'static>(&self, key: &WindowProperty<T>) -> Option<&T> {
        self.values.get(key.name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Stores `value` and returns the previous value of the same type.
    pub fn set<T: 'static>(&mut self, key: &WindowProperty<T>, value: T) -> Option<T> {
        self.values
            .insert(key.name, Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn clear<T: 'static>(&mut self, key: &WindowProperty<T>) -> Option<T> {
        self.values
            .remove(key.name)
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}

impl fmt::Debug for PropertyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
