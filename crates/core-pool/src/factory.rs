//! Object construction and reset strategies
//!
//! A pool needs two things from its element type: a way to build a fresh
//! instance and a way to bring a used instance back to its default field
//! values. [`ObjectFactory`] bundles both.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Factory trait for creating and resetting pooled objects
pub trait ObjectFactory<T>: Send + Sync {
    /// Construct a new object with default field values
    fn create(&self) -> T;

    /// Restore a released object to default field values
    fn reset(&self, object: &mut T);
}

/// Factory built from a pair of closures
///
/// # Example
/// ```
/// use quench_core_pool::{FnFactory, ObjectFactory};
///
/// let factory = FnFactory::new(|| vec![0u8; 16], |buf: &mut Vec<u8>| buf.fill(0));
/// let mut buf = factory.create();
/// buf[0] = 7;
/// factory.reset(&mut buf);
/// assert_eq!(buf[0], 0);
/// ```
pub struct FnFactory<C, R> {
    create: C,
    reset: R,
}

impl<C, R> FnFactory<C, R> {
    /// Create a factory from a constructor and a reset function
    pub fn new(create: C, reset: R) -> Self {
        Self { create, reset }
    }
}

impl<T, C, R> ObjectFactory<T> for FnFactory<C, R>
where
    C: Fn() -> T + Send + Sync,
    R: Fn(&mut T) + Send + Sync,
{
    fn create(&self) -> T {
        (self.create)()
    }

    fn reset(&self, object: &mut T) {
        (self.reset)(object)
    }
}

/// Factory for `Default` types that resets by overwriting with `T::default()`
///
/// Simple, but it drops any heap allocation the object built up. Prefer
/// [`RecycleFactory`] for containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl<T: Default> ObjectFactory<T> for DefaultFactory {
    fn create(&self) -> T {
        T::default()
    }

    fn reset(&self, object: &mut T) {
        *object = T::default();
    }
}

/// Types that can clear their contents in place while keeping allocations
pub trait Recycle {
    /// Return to the empty state without releasing capacity
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<T> Recycle for VecDeque<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl Recycle for String {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<K: Eq + Hash, V> Recycle for HashMap<K, V> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<T: Eq + Hash> Recycle for HashSet<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Recycle for BTreeMap<K, V> {
    fn recycle(&mut self) {
        self.clear();
    }
}

/// Factory for containers: builds with a capacity hint, resets via [`Recycle`]
#[derive(Debug, Clone, Copy)]
pub struct RecycleFactory<T> {
    build: fn() -> T,
}

impl<T: Default + Recycle> Default for RecycleFactory<T> {
    fn default() -> Self {
        Self { build: T::default }
    }
}

impl<T: Recycle> RecycleFactory<T> {
    /// Use a custom constructor, e.g. `|| Vec::with_capacity(4096)`
    pub fn with_constructor(build: fn() -> T) -> Self {
        Self { build }
    }
}

impl<T: Recycle> ObjectFactory<T> for RecycleFactory<T> {
    fn create(&self) -> T {
        (self.build)()
    }

    fn reset(&self, object: &mut T) {
        object.recycle();
    }
}
