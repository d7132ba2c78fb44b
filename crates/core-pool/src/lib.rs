//! Quench Core Pool: Pure-logic object recycling
//!
//! # Overview
//!
//! A [`Pool`] manages a bounded set of reusable mutable objects. Callers
//! [`acquire`](Pool::acquire) an object, mutate it, and
//! [`release`](Pool::release) it when done; the pool resets it and keeps it
//! for the next caller instead of letting it be freed and reallocated.
//!
//! ```text
//!            acquire()                       release(handle)
//!   ┌──────────────────────┐        ┌──────────────────────────────┐
//!   │ free list non-empty? │        │ handle in-use in this pool?  │
//!   │   yes → pop (LIFO)   │        │   no  → InvalidRelease       │
//!   │   no  → live < cap?  │        │   yes → reset(obj)           │
//!   │     yes → factory()  │        │         push onto free list  │
//!   │     no  → Exhausted  │        └──────────────────────────────┘
//!   └──────────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - **Explicit release**: objects never return on their own. A dropped
//!   [`Handle`] is a leak, not a reclamation.
//! - **Never blocks**: an exhausted pool fails immediately with
//!   [`PoolError::PoolExhausted`].
//! - **Never shrinks**: constructed objects live as long as the pool.
//!
//! # Usage Example
//!
//! ```
//! use quench_core_pool::{Pool, PoolConfig, RecycleFactory, PoolError};
//!
//! # fn main() -> Result<(), PoolError> {
//! let pool = Pool::new(
//!     RecycleFactory::with_constructor(|| Vec::<u8>::with_capacity(4096)),
//!     PoolConfig::bounded(16).with_prewarm(4),
//! )?;
//!
//! let mut buf = pool.acquire()?;
//! buf.extend_from_slice(b"frame");
//! pool.release(buf)?;
//!
//! assert_eq!(pool.stats().created, 4);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod pool;

// Re-export main types for convenience
pub use error::{PoolError, ReleaseFault, Result};
pub use factory::{DefaultFactory, FnFactory, ObjectFactory, Recycle, RecycleFactory};
pub use pool::{Handle, ObjectId, Pool, PoolConfig, PoolStats};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::error::PoolError;
    pub use super::factory::{ObjectFactory, Recycle, RecycleFactory};
    pub use super::pool::{Handle, Pool, PoolConfig};
}
