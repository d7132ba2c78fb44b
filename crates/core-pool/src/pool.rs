//! Bounded object pool with explicit release
//!
//! Hands out reusable objects and takes them back after a reset, so hot code
//! paths stop allocating. Objects are constructed lazily on the first
//! shortfall (or ahead of time by prewarming) and live until the pool itself
//! is dropped. Nothing is reclaimed implicitly: a [`Handle`] that is dropped
//! instead of released leaks its slot for the lifetime of the pool.

use crate::error::{PoolError, ReleaseFault, Result};
use crate::factory::{DefaultFactory, FnFactory, ObjectFactory};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for pool sizing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of objects the pool will ever construct (None = unbounded)
    #[serde(default)]
    pub capacity: Option<usize>,

    /// Number of objects to construct up front
    #[serde(default)]
    pub prewarm: usize,
}

impl PoolConfig {
    /// A pool that constructs at most `capacity` objects
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            prewarm: 0,
        }
    }

    /// A pool with no construction limit
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Construct `prewarm` objects when the pool is built
    pub fn with_prewarm(mut self, prewarm: usize) -> Self {
        self.prewarm = prewarm;
        self
    }

    /// Reject configurations that can never hand out an object
    pub fn validate(&self) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Err(PoolError::invalid_config("capacity must be > 0"));
            }
            if self.prewarm > capacity {
                return Err(PoolError::invalid_config(format!(
                    "prewarm ({}) exceeds capacity ({})",
                    self.prewarm, capacity
                )));
            }
        }
        Ok(())
    }
}

/// Stable identity of a pooled object
///
/// The slot index is assigned when the object is constructed and never
/// changes, so two handles with equal ids refer to the same underlying object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pool: u64,
    slot: usize,
}

impl ObjectId {
    /// Id of the pool that owns the object
    pub fn pool_id(&self) -> u64 {
        self.pool
    }

    /// Slot index within the owning pool
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}/slot#{}", self.pool, self.slot)
    }
}

/// An acquired object plus its bookkeeping identity
///
/// Owns the object while it is in use. Not `Clone`: exactly one holder exists
/// per object. Return it with [`Pool::release`].
#[must_use = "pooled objects are not returned automatically; pass the handle to Pool::release"]
pub struct Handle<T> {
    id: ObjectId,
    value: T,
}

impl<T> Handle<T> {
    /// Identity of the underlying object
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}

/// Internal pool state
struct PoolState<T> {
    /// Released objects, popped from the back (LIFO)
    free: Vec<(usize, T)>,
    /// In-use flag per constructed slot; `len()` is the live object count
    in_use: Vec<bool>,
    /// Number of `true` entries in `in_use`
    in_use_count: usize,
    created: u64,
    reused: u64,
    exhausted: u64,
}

impl<T> PoolState<T> {
    fn new(capacity: Option<usize>) -> Self {
        let reserve = capacity.unwrap_or(0);
        Self {
            free: Vec::with_capacity(reserve),
            in_use: Vec::with_capacity(reserve),
            in_use_count: 0,
            created: 0,
            reused: 0,
            exhausted: 0,
        }
    }

    fn live(&self) -> usize {
        self.in_use.len()
    }

    /// Claim a brand-new slot; the object itself is built outside the lock
    fn reserve_slot(&mut self) -> usize {
        let slot = self.in_use.len();
        self.in_use.push(true);
        self.in_use_count += 1;
        self.created += 1;
        slot
    }

    fn check_release(&self, pool_id: u64, id: ObjectId) -> Result<()> {
        if id.pool != pool_id {
            return Err(PoolError::InvalidRelease {
                id,
                reason: ReleaseFault::ForeignPool,
            });
        }
        match self.in_use.get(id.slot) {
            Some(true) => Ok(()),
            _ => Err(PoolError::InvalidRelease {
                id,
                reason: ReleaseFault::NotInUse,
            }),
        }
    }

    fn push_free(&mut self, slot: usize, value: T) {
        self.in_use[slot] = false;
        self.in_use_count -= 1;
        self.free.push((slot, value));
    }
}

/// A generic object pool
///
/// # Example
/// ```
/// use quench_core_pool::{Pool, PoolError};
///
/// #[derive(Default)]
/// struct Vector { x: i32, y: i32 }
///
/// # fn main() -> Result<(), PoolError> {
/// let pool = Pool::from_fns(
///     Vector::default,
///     |v: &mut Vector| { v.x = 0; v.y = 0; },
///     Some(1),
/// )?;
///
/// let mut v = pool.acquire()?;
/// v.x = 10;
/// let first = v.id();
/// pool.release(v)?;
///
/// // Same object comes back, already reset
/// let v = pool.acquire()?;
/// assert_eq!(v.id(), first);
/// assert_eq!(v.x, 0);
/// # pool.release(v)?;
/// # Ok(())
/// # }
/// ```
pub struct Pool<T> {
    id: u64,
    config: PoolConfig,
    factory: Box<dyn ObjectFactory<T>>,
    state: Mutex<PoolState<T>>,
}

impl<T: Send + 'static> Pool<T> {
    /// Create a new pool, constructing `config.prewarm` objects immediately
    pub fn new<F>(factory: F, config: PoolConfig) -> Result<Self>
    where
        F: ObjectFactory<T> + 'static,
    {
        config.validate()?;
        let pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(PoolState::new(config.capacity)),
            factory: Box::new(factory),
            config,
        };
        if pool.config.prewarm > 0 {
            pool.prewarm(pool.config.prewarm);
        }
        debug!(
            pool = pool.id,
            capacity = ?pool.config.capacity,
            prewarm = pool.config.prewarm,
            "pool created"
        );
        Ok(pool)
    }

    /// Create a pool from a constructor, a reset function and an optional capacity
    pub fn from_fns<C, R>(create: C, reset: R, capacity: Option<usize>) -> Result<Self>
    where
        C: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        let config = PoolConfig {
            capacity,
            prewarm: 0,
        };
        Self::new(FnFactory::new(create, reset), config)
    }

    /// Acquire an object
    ///
    /// Reuses the most recently released object if one is free. Otherwise a
    /// new object is constructed, unless the pool already built `capacity`
    /// objects, in which case this fails immediately with
    /// [`PoolError::PoolExhausted`]. Never waits.
    pub fn acquire(&self) -> Result<Handle<T>> {
        let slot = {
            let mut state = self.state.lock();

            if let Some((slot, value)) = state.free.pop() {
                state.in_use[slot] = true;
                state.in_use_count += 1;
                state.reused += 1;
                trace!(pool = self.id, slot, "reused pooled object");
                return Ok(self.handle(slot, value));
            }

            if let Some(capacity) = self.config.capacity {
                if state.live() >= capacity {
                    state.exhausted += 1;
                    debug!(pool = self.id, capacity, "pool exhausted");
                    return Err(PoolError::PoolExhausted { capacity });
                }
            }

            state.reserve_slot()
        };

        let value = self.factory.create();
        trace!(pool = self.id, slot, "constructed pooled object");
        Ok(self.handle(slot, value))
    }

    /// Return an object to the pool
    ///
    /// The object is reset before it becomes available again. A handle from
    /// another pool is rejected with [`PoolError::InvalidRelease`] and its
    /// object is dropped.
    pub fn release(&self, handle: Handle<T>) -> Result<()> {
        let Handle { id, mut value } = handle;

        if let Err(e) = self.state.lock().check_release(self.id, id) {
            warn!(pool = self.id, object = %id, error = %e, "rejected release");
            return Err(e);
        }

        // The handle is the only owner; no other caller can touch this slot
        // until it is back on the free list.
        self.factory.reset(&mut value);

        self.state.lock().push_free(id.slot, value);
        trace!(pool = self.id, slot = id.slot, "released pooled object");
        Ok(())
    }

    /// Construct objects until `target` are free, bounded by capacity
    ///
    /// Returns the number of objects constructed.
    pub fn prewarm(&self, target: usize) -> usize {
        let reserved: Vec<usize> = {
            let mut state = self.state.lock();
            let missing = target.saturating_sub(state.free.len());
            let headroom = self
                .config
                .capacity
                .map_or(missing, |capacity| capacity.saturating_sub(state.live()));
            (0..missing.min(headroom))
                .map(|_| state.reserve_slot())
                .collect()
        };

        let built: Vec<(usize, T)> = reserved
            .into_iter()
            .map(|slot| (slot, self.factory.create()))
            .collect();
        let count = built.len();

        let mut state = self.state.lock();
        // Lowest slot on top of the stack so it is handed out first
        for (slot, value) in built.into_iter().rev() {
            state.push_free(slot, value);
        }
        drop(state);

        if count > 0 {
            debug!(pool = self.id, count, "prewarmed pool");
        }
        count
    }

    /// Number of live (constructed) objects, in use or free
    pub fn size(&self) -> usize {
        self.state.lock().live()
    }

    /// Number of free objects ready to be acquired without construction
    pub fn available(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Number of objects currently held by callers
    pub fn in_use(&self) -> usize {
        self.state.lock().in_use_count
    }

    /// Maximum number of objects this pool will construct
    pub fn capacity(&self) -> Option<usize> {
        self.config.capacity
    }

    /// Unique id of this pool instance
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            live: state.live(),
            in_use: state.in_use_count,
            available: state.free.len(),
            capacity: self.config.capacity,
            created: state.created,
            reused: state.reused,
            exhausted: state.exhausted,
        }
    }

    fn handle(&self, slot: usize, value: T) -> Handle<T> {
        Handle {
            id: ObjectId {
                pool: self.id,
                slot,
            },
            value,
        }
    }
}

impl<T: Default + Send + 'static> Pool<T> {
    /// Create a pool that builds and resets objects through `T::default()`
    pub fn with_default(config: PoolConfig) -> Result<Self> {
        Self::new(DefaultFactory, config)
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("capacity", &self.config.capacity)
            .field("live", &state.live())
            .field("available", &state.free.len())
            .finish()
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Objects constructed so far (in use + free)
    pub live: usize,
    /// Objects currently held by callers
    pub in_use: usize,
    /// Objects waiting on the free list
    pub available: usize,
    /// Construction limit
    pub capacity: Option<usize>,
    /// Total constructions (pool misses)
    pub created: u64,
    /// Acquisitions served from the free list (pool hits)
    pub reused: u64,
    /// Acquisitions refused because the pool was exhausted
    pub exhausted: u64,
}

impl PoolStats {
    /// Share of capacity currently in use, as a percentage (0 when unbounded)
    pub fn utilization(&self) -> f64 {
        match self.capacity {
            Some(capacity) if capacity > 0 => (self.in_use as f64 / capacity as f64) * 100.0,
            _ => 0.0,
        }
    }

    /// Fraction of acquisitions served without construction (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.created + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}
