/*!
 * Deterministic replays for the CLI and integration tests
 *
 * Governor timelines run on a [`ManualScheduler`], so a replay of offsets
 * `0,30,60` takes microseconds and always produces the same report. Pool
 * scripts drive a bounded pool of scratch buffers one operation at a time.
 */

use crate::error::{QuenchError, Result};
use parking_lot::Mutex;
use quench_core_governor::{Governor, GovernorConfig, GovernorMode, ManualScheduler};
use quench_core_pool::{FnFactory, Handle, ObjectId, Pool, PoolConfig, PoolStats};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Initial capacity of each scratch buffer handed out by the pool script
const SCRATCH_BYTES: usize = 4096;

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One call of the governed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Virtual time of the call, in ms since the replay started
    pub at_ms: u64,
    /// Index of the trigger whose arguments were used
    pub trigger_index: usize,
    /// Offset at which that trigger was sent
    pub trigger_at_ms: u64,
}

/// Outcome of [`replay_governor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernorReport {
    pub mode: GovernorMode,
    pub interval_ms: u64,
    pub immediate: bool,
    pub triggers: usize,
    /// `Some(pending)` if a cancel was replayed, where `pending` says whether
    /// an invocation was dropped by it
    pub cancelled: Option<bool>,
    pub invocations: Vec<Invocation>,
}

/// Replay trigger offsets (ms, non-decreasing) through a governor
///
/// A `cancel_at` offset equal to a trigger offset is applied after that
/// trigger. Timers still pending after the last event are run to completion.
pub fn replay_governor(
    config: &GovernorConfig,
    triggers: &[u64],
    cancel_at: Option<u64>,
) -> Result<GovernorReport> {
    if let Some(pair) = triggers.windows(2).find(|pair| pair[1] < pair[0]) {
        return Err(QuenchError::Parse(format!(
            "trigger offsets must be non-decreasing ({} follows {})",
            pair[1], pair[0]
        )));
    }

    let clock = ManualScheduler::new();
    let log: Arc<Mutex<Vec<Invocation>>> = Arc::new(Mutex::new(Vec::new()));

    let governor = {
        let clock = clock.clone();
        let log = Arc::clone(&log);
        let offsets: Arc<[u64]> = triggers.into();
        Governor::new(config.clone(), clock.clone(), move |index: usize| {
            log.lock().push(Invocation {
                at_ms: millis(clock.elapsed()),
                trigger_index: index,
                trigger_at_ms: offsets[index],
            });
        })?
    };

    info!(
        mode = %config.mode,
        interval_ms = millis(config.interval),
        triggers = triggers.len(),
        "replaying governor timeline"
    );

    let mut cancel_at = cancel_at;
    let mut cancelled = None;
    for (index, &offset) in triggers.iter().enumerate() {
        if let Some(at) = cancel_at.filter(|&at| at < offset) {
            clock.advance_to(Duration::from_millis(at));
            cancelled = Some(governor.cancel());
            cancel_at = None;
        }
        clock.advance_to(Duration::from_millis(offset));
        governor.trigger(index);
    }
    if let Some(at) = cancel_at {
        clock.advance_to(Duration::from_millis(at));
        cancelled = Some(governor.cancel());
    }
    let drained = clock.run_until_idle();
    debug!(drained, "timeline drained");

    let invocations = log.lock().clone();
    Ok(GovernorReport {
        mode: config.mode,
        interval_ms: millis(config.interval),
        immediate: config.immediate,
        triggers: triggers.len(),
        cancelled,
        invocations,
    })
}

impl fmt::Display for GovernorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} interval={}ms immediate={}: {} trigger(s), {} invocation(s)",
            self.mode,
            self.interval_ms,
            self.immediate,
            self.triggers,
            self.invocations.len()
        )?;
        for call in &self.invocations {
            writeln!(
                f,
                "  t={:>6}ms  trigger #{} (sent at t={}ms)",
                call.at_ms, call.trigger_index, call.trigger_at_ms
            )?;
        }
        match self.cancelled {
            Some(true) => writeln!(f, "  cancel dropped a pending invocation"),
            Some(false) => writeln!(f, "  cancel found nothing pending"),
            None => Ok(()),
        }
    }
}

/// One operation of a pool script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "ticket", rename_all = "kebab-case")]
pub enum PoolOp {
    /// `a`: acquire an object; success issues the next ticket number
    Acquire,
    /// `r<n>`: release the object held under ticket `n`
    Release(usize),
    /// `f`: release a handle taken from a different pool
    ReleaseForeign,
}

impl FromStr for PoolOp {
    type Err = QuenchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "a" | "acquire" => Ok(PoolOp::Acquire),
            "f" | "foreign" => Ok(PoolOp::ReleaseForeign),
            _ => s
                .strip_prefix('r')
                .and_then(|ticket| ticket.parse().ok())
                .map(PoolOp::Release)
                .ok_or_else(|| {
                    QuenchError::Parse(format!(
                        "unknown pool op '{}' (expected a, r<ticket> or f)",
                        s
                    ))
                }),
        }
    }
}

impl fmt::Display for PoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolOp::Acquire => write!(f, "a"),
            PoolOp::Release(ticket) => write!(f, "r{}", ticket),
            PoolOp::ReleaseForeign => write!(f, "f"),
        }
    }
}

/// Parse a comma-separated script such as `a,a,r0,a`
pub fn parse_script(script: &str) -> Result<Vec<PoolOp>> {
    script
        .split(',')
        .filter(|op| !op.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// What happened at one step of a pool script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StepOutcome {
    Acquired {
        ticket: usize,
        object: String,
        reused: bool,
    },
    Released {
        /// None for a foreign handle
        #[serde(skip_serializing_if = "Option::is_none")]
        ticket: Option<usize>,
        object: String,
    },
    Rejected {
        error: String,
    },
}

/// One executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStep {
    pub op: PoolOp,
    pub outcome: StepOutcome,
}

/// Outcome of [`run_pool_script`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolReport {
    pub steps: Vec<PoolStep>,
    pub stats: PoolStats,
    pub utilization: f64,
    pub hit_rate: f64,
}

/// Run a pool script against a pool of scratch buffers
///
/// Pool errors are recorded as rejected steps, not returned. Releasing a
/// ticket that was never issued, or was already released, is a script error.
pub fn run_pool_script(config: &PoolConfig, ops: &[PoolOp]) -> Result<PoolReport> {
    let factory = FnFactory::new(
        || Vec::<u8>::with_capacity(SCRATCH_BYTES),
        |buf: &mut Vec<u8>| buf.clear(),
    );
    let pool: Pool<Vec<u8>> = Pool::new(factory, config.clone())?;

    let mut held: Vec<Option<Handle<Vec<u8>>>> = Vec::new();
    let mut steps = Vec::with_capacity(ops.len());

    for &op in ops {
        let outcome = match op {
            PoolOp::Acquire => {
                let created_before = pool.stats().created;
                match pool.acquire() {
                    Ok(mut handle) => {
                        handle.extend_from_slice(b"scratch");
                        let ticket = held.len();
                        let outcome = StepOutcome::Acquired {
                            ticket,
                            object: handle.id().to_string(),
                            reused: pool.stats().created == created_before,
                        };
                        held.push(Some(handle));
                        outcome
                    }
                    Err(e) => StepOutcome::Rejected {
                        error: e.to_string(),
                    },
                }
            }
            PoolOp::Release(ticket) => {
                let handle = held
                    .get_mut(ticket)
                    .and_then(Option::take)
                    .ok_or_else(|| {
                        QuenchError::Parse(format!(
                            "ticket {} is not held (issued: {})",
                            ticket,
                            held.len()
                        ))
                    })?;
                let object: ObjectId = handle.id();
                match pool.release(handle) {
                    Ok(()) => StepOutcome::Released {
                        ticket: Some(ticket),
                        object: object.to_string(),
                    },
                    Err(e) => StepOutcome::Rejected {
                        error: e.to_string(),
                    },
                }
            }
            PoolOp::ReleaseForeign => {
                let other: Pool<Vec<u8>> =
                    Pool::from_fns(Vec::<u8>::new, Vec::<u8>::clear, Some(1))?;
                let stranger = other.acquire()?;
                let object = stranger.id().to_string();
                match pool.release(stranger) {
                    Ok(()) => StepOutcome::Released {
                        ticket: None,
                        object,
                    },
                    Err(e) => StepOutcome::Rejected {
                        error: e.to_string(),
                    },
                }
            }
        };
        debug!(%op, ?outcome, "pool step");
        steps.push(PoolStep { op, outcome });
    }

    // Return outstanding handles so the final stats reflect the script only
    let stats = pool.stats();
    for handle in held.into_iter().flatten() {
        pool.release(handle)?;
    }

    Ok(PoolReport {
        steps,
        utilization: stats.utilization(),
        hit_rate: stats.hit_rate(),
        stats,
    })
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            write!(f, "{:>3}  {:<4} ", index, step.op.to_string())?;
            match &step.outcome {
                StepOutcome::Acquired {
                    ticket,
                    object,
                    reused,
                } => writeln!(
                    f,
                    "acquired ticket {} -> {} ({})",
                    ticket,
                    object,
                    if *reused { "reused" } else { "new" }
                )?,
                StepOutcome::Released {
                    ticket: Some(ticket),
                    object,
                } => writeln!(f, "released ticket {} ({})", ticket, object)?,
                StepOutcome::Released { ticket: None, object } => {
                    writeln!(f, "released foreign {}", object)?
                }
                StepOutcome::Rejected { error } => writeln!(f, "rejected: {}", error)?,
            }
        }
        let capacity = self
            .stats
            .capacity
            .map_or_else(|| "unbounded".to_string(), |c| c.to_string());
        writeln!(
            f,
            "live={} in_use={} available={} capacity={} created={} reused={} exhausted={}",
            self.stats.live,
            self.stats.in_use,
            self.stats.available,
            capacity,
            self.stats.created,
            self.stats.reused,
            self.stats.exhausted
        )?;
        writeln!(
            f,
            "utilization={:.1}% hit_rate={:.2}",
            self.utilization, self.hit_rate
        )
    }
}
