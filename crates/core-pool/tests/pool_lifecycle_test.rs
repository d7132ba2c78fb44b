//! Pool lifecycle checks through the public API
//!
//! Covers the allocate / use / free cycle of a vector pool, identity across
//! reuse, and the two caller-error paths.

use quench_core_pool::{Pool, PoolConfig, PoolError, ReleaseFault};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Vector {
    x: f64,
    y: f64,
}

fn add_vector(a: &Vector, b: &Vector, out: &mut Vector) {
    out.x = a.x + b.x;
    out.y = a.y + b.y;
}

fn vector_pool(capacity: usize) -> Pool<Vector> {
    Pool::from_fns(
        Vector::default,
        |v: &mut Vector| *v = Vector::default(),
        Some(capacity),
    )
    .unwrap()
}

#[test]
fn test_vector_math_without_allocation_churn() {
    let pool = vector_pool(3);

    for round in 0..10 {
        let mut v1 = pool.acquire().unwrap();
        let mut v2 = pool.acquire().unwrap();
        let mut v3 = pool.acquire().unwrap();

        // Released objects come back zeroed
        assert_eq!(*v3, Vector::default());

        v1.x = 10.0;
        v1.y = 5.0;
        v2.x = -3.0;
        v2.y = -6.0;
        add_vector(&v1, &v2, &mut v3);
        assert_eq!((v3.x, v3.y), (7.0, -1.0), "round {round}");

        pool.release(v1).unwrap();
        pool.release(v2).unwrap();
        pool.release(v3).unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.created, 3);
    assert_eq!(stats.reused, 27);
    assert_eq!(stats.live, 3);
}

#[test]
fn test_capacity_one_identity() {
    let pool = vector_pool(1);

    let first = pool.acquire().unwrap();
    let id = first.id();
    pool.release(first).unwrap();

    let second = pool.acquire().unwrap();
    assert_eq!(second.id(), id);
    assert_eq!(pool.size(), 1);
    pool.release(second).unwrap();
}

#[test]
fn test_capacity_plus_one_fails() {
    let capacity = 5;
    let pool = vector_pool(capacity);

    let held: Vec<_> = (0..capacity).map(|_| pool.acquire().unwrap()).collect();
    match pool.acquire() {
        Err(PoolError::PoolExhausted { capacity: c }) => assert_eq!(c, capacity),
        other => panic!("expected PoolExhausted, got {:?}", other),
    }

    for handle in held {
        pool.release(handle).unwrap();
    }
    assert_eq!(pool.available(), capacity);
}

#[test]
fn test_release_of_never_acquired_object() {
    let pool = vector_pool(2);
    let elsewhere = vector_pool(2);

    let foreign = elsewhere.acquire().unwrap();
    let err = pool.release(foreign).unwrap_err();
    assert!(matches!(
        err,
        PoolError::InvalidRelease {
            reason: ReleaseFault::ForeignPool,
            ..
        }
    ));
    assert!(!err.is_recoverable());

    // The rejecting pool is untouched
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.available(), 0);
}

#[test]
fn test_config_from_toml() {
    let config: PoolConfig = toml::from_str("capacity = 8\nprewarm = 2\n").unwrap();
    assert_eq!(config, PoolConfig::bounded(8).with_prewarm(2));

    let unbounded: PoolConfig = toml::from_str("").unwrap();
    assert_eq!(unbounded.capacity, None);
    assert_eq!(unbounded.prewarm, 0);
}

#[test]
fn test_stats_serialize() {
    let pool = vector_pool(2);
    let v = pool.acquire().unwrap();
    let json = serde_json::to_value(pool.stats()).unwrap();
    assert_eq!(json["in_use"], 1);
    assert_eq!(json["capacity"], 2);
    pool.release(v).unwrap();
}
