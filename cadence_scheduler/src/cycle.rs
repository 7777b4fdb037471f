//! Fixed-period driver for `CommandScheduler::run`.
//!
//! The scheduler itself never sleeps; [`LoopRunner`] owns pacing. Wake-ups
//! are computed as absolute deadlines (`start + n * period`) so jitter in one
//! tick does not accumulate into drift.
//!
//! ## RT Setup Sequence (`rt` feature)
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the requested core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! Without the feature every step is a no-op and the loop sleeps with
//! `std::thread::sleep`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cadence_common::config::SchedulerConfig;
use thiserror::Error;
use tracing::warn;

use crate::scheduler::CommandScheduler;

/// Timing summary of a [`LoopRunner`] session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    /// Ticks whose `run()` took longer than the period.
    pub overruns: u64,
    pub slowest_tick: Duration,
    /// Worst gap between a scheduled wake-up and the tick actually starting.
    pub worst_wake_latency: Duration,
    busy: Duration,
}

impl LoopStats {
    /// Returns `true` when the tick overran `period`.
    fn record(&mut self, took: Duration, latency: Duration, period: Duration) -> bool {
        self.ticks += 1;
        self.busy += took;
        self.slowest_tick = self.slowest_tick.max(took);
        self.worst_wake_latency = self.worst_wake_latency.max(latency);
        let overran = took > period;
        if overran {
            self.overruns += 1;
        }
        overran
    }

    pub fn mean_tick(&self) -> Duration {
        let ticks = u32::try_from(self.ticks).unwrap_or(u32::MAX);
        self.busy.checked_div(ticks).unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("RT setup: {step} failed: {source}")]
    RtSetup {
        step: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("monotonic clock unavailable: {0}")]
    Clock(#[source] std::io::Error),
}

/// Where and how urgently the loop thread runs.
///
/// With the `rt` feature, [`RtPlacement::apply`] locks memory, prefaults the
/// stack, pins the thread to `cpu_core` and switches it to `SCHED_FIFO` at
/// `priority`. Without it nothing changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtPlacement {
    pub cpu_core: usize,
    pub priority: i32,
}

impl RtPlacement {
    /// Call once, on the loop thread, before [`LoopRunner::run`].
    pub fn apply(&self) -> Result<(), LoopError> {
        #[cfg(feature = "rt")]
        {
            rt::lock_memory()?;
            rt::prefault_stack();
            rt::pin(self.cpu_core)?;
            rt::raise_priority(self.priority)?;
            tracing::info!(
                "Loop thread on core {} at SCHED_FIFO {}",
                self.cpu_core, self.priority
            );
        }

        #[cfg(not(feature = "rt"))]
        tracing::debug!(
            cpu_core = self.cpu_core,
            priority = self.priority,
            "Built without `rt`; skipping thread placement"
        );

        Ok(())
    }
}

#[cfg(feature = "rt")]
mod rt {
    use std::io;

    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::unistd::Pid;

    use super::LoopError;

    fn failed(step: &'static str) -> impl FnOnce(nix::Error) -> LoopError {
        move |errno| LoopError::RtSetup {
            step,
            source: errno.into(),
        }
    }

    pub(super) fn lock_memory() -> Result<(), LoopError> {
        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE).map_err(failed("mlockall"))
    }

    /// Touch 256 KiB of stack so the loop does not fault on first use.
    pub(super) fn prefault_stack() {
        let mut buf = [0u8; 256 * 1024];
        for byte in buf.iter_mut() {
            // SAFETY: `byte` is a valid, exclusive reference into `buf`.
            unsafe { core::ptr::write_volatile(byte, 0xFF) };
        }
        core::hint::black_box(&buf);
    }

    pub(super) fn pin(cpu: usize) -> Result<(), LoopError> {
        let mut cpuset = CpuSet::new();
        cpuset.set(cpu).map_err(failed("CpuSet::set"))?;
        sched_setaffinity(Pid::from_raw(0), &cpuset).map_err(failed("sched_setaffinity"))
    }

    pub(super) fn raise_priority(priority: i32) -> Result<(), LoopError> {
        let param = libc::sched_param {
            sched_priority: priority,
        };
        // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            return Err(LoopError::RtSetup {
                step: "sched_setscheduler",
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

// ─── Loop Runner ────────────────────────────────────────────────────

/// Calls `CommandScheduler::run` once per period until stopped.
pub struct LoopRunner {
    period: Duration,
    overrun_warn: bool,
    tick_limit: Option<u64>,
    stats: LoopStats,
}

impl LoopRunner {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            overrun_warn: config.overrun_warn,
            ..Self::with_period(config.period())
        }
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            overrun_warn: true,
            tick_limit: None,
            stats: LoopStats::default(),
        }
    }

    /// Stop on its own after `limit` ticks.
    pub fn with_tick_limit(mut self, limit: u64) -> Self {
        self.tick_limit = Some(limit);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Drive the scheduler until `running` is cleared or the tick limit is
    /// reached.
    ///
    /// `before_tick` runs ahead of every `run()` with the zero-based tick
    /// index; it is where the caller feeds inputs the triggers read.
    pub fn run(
        &mut self,
        scheduler: &mut CommandScheduler,
        running: &AtomicBool,
        before_tick: impl FnMut(&mut CommandScheduler, u64),
    ) -> Result<(), LoopError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(scheduler, running, before_tick)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(scheduler, running, before_tick)
        }
    }

    fn should_continue(&self, running: &AtomicBool) -> bool {
        running.load(Ordering::SeqCst)
            && self
                .tick_limit
                .is_none_or(|limit| self.stats.ticks < limit)
    }

    fn finish_tick(&mut self, took: Duration, latency: Duration) {
        if self.stats.record(took, latency, self.period) && self.overrun_warn {
            warn!(
                "Tick {} overran: {took:?} > {:?} period",
                self.stats.ticks, self.period
            );
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(
        &mut self,
        scheduler: &mut CommandScheduler,
        running: &AtomicBool,
        mut before_tick: impl FnMut(&mut CommandScheduler, u64),
    ) -> Result<(), LoopError> {
        use std::time::Instant;

        let mut next_wake = Instant::now();

        while self.should_continue(running) {
            let tick_start = Instant::now();
            let latency = tick_start.saturating_duration_since(next_wake);

            before_tick(scheduler, self.stats.ticks);
            scheduler.run();

            self.finish_tick(tick_start.elapsed(), latency);

            next_wake += self.period;
            let now = Instant::now();
            if next_wake > now {
                std::thread::sleep(next_wake - now);
            } else {
                // Fell behind by more than a period: resynchronise.
                next_wake = now;
            }
        }
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(
        &mut self,
        scheduler: &mut CommandScheduler,
        running: &AtomicBool,
        mut before_tick: impl FnMut(&mut CommandScheduler, u64),
    ) -> Result<(), LoopError> {
        use nix::sys::time::TimeSpec;
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|errno| LoopError::Clock(errno.into()));
        let period = TimeSpec::from_duration(self.period);
        let mut next_wake = now()?;

        while self.should_continue(running) {
            let tick_start = now()?;
            let latency = elapsed(tick_start, next_wake);

            before_tick(scheduler, self.stats.ticks);
            scheduler.run();

            let tick_end = now()?;
            self.finish_tick(elapsed(tick_end, tick_start), latency);

            next_wake = next_wake + period;
            if next_wake <= tick_end {
                next_wake = tick_end;
                continue;
            }
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }
}

/// `later - earlier`, clamped at zero.
#[cfg(feature = "rt")]
fn elapsed(later: nix::sys::time::TimeSpec, earlier: nix::sys::time::TimeSpec) -> Duration {
    use nix::sys::time::TimeValueLike;
    Duration::from_nanos(u64::try_from((later - earlier).num_nanoseconds()).unwrap_or(0))
}

// ─── Tests ──────────────────────────────────────────────────────────
