//! Periodic limiter cycle: read → limit → alert → publish.
//!
//! ## RT Setup Sequence
//! The runner pre-allocates its sample and output buffers; [`RtSetup`] then
//! locks memory, prefaults a stack area sized by joint count, pins the
//! thread and switches it to `SCHED_FIFO`.
//!
//! ## Cycle Loop
//! With the `rt` feature the loop sleeps on absolute `CLOCK_MONOTONIC`
//! deadlines; otherwise it uses `std::thread::sleep`. Overruns are counted
//! and logged, never fatal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use thermo_common::consts::MAX_JOINTS;
use thermo_common::thermal::{CycleSample, TauMaxOutput};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alert::AlertSignaler;
use crate::config::{LoadedConfig, resolve_controller_params, resolve_thermal_params};
use crate::control::two_dof::{TwoDofController, controller_bank};
use crate::error::InitError;
use crate::io::{OutputSink, SampleSource};
use crate::limiter::ThermalLimiter;
use crate::service::ThermoLimiterServiceImpl;
use crate::state::lifecycle::{Lifecycle, LifecycleEvent, LifecycleState, TransitionResult};
use crate::store::ThermalStore;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Sum of all cycle durations [ns], for the average.
    pub sum_cycle_ns: i64,
    /// Number of cycles that exceeded `dt`.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    /// Empty statistics.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record one cycle.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
    /// Monotonic clock unavailable.
    #[error("clock error: {0}")]
    Clock(String),
    /// `run` called outside the `Running` state.
    #[error("cycle not running (state {0})")]
    NotRunning(LifecycleState),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Stack touched before the loop regardless of joint count.
const PREFAULT_BASE_BYTES: usize = 64 * 1024;

/// Stack reserved per joint: the record, its sample and output slots, and
/// the frames of the per-joint tracing path.
const PREFAULT_PER_JOINT_BYTES: usize = 1024;

/// Real-time placement of the limiter thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtSetup {
    /// CPU core the cycle thread is pinned to.
    pub cpu_core: usize,
    /// `SCHED_FIFO` priority.
    pub priority: i32,
    /// Stack bytes prefaulted before the first cycle.
    pub prefault_bytes: usize,
}

impl RtSetup {
    /// Placement for a limiter handling `num_joints` joints.
    pub fn for_joints(num_joints: usize, cpu_core: usize, priority: i32) -> Self {
        Self {
            cpu_core,
            priority,
            prefault_bytes: PREFAULT_BASE_BYTES
                + num_joints.min(MAX_JOINTS) * PREFAULT_PER_JOINT_BYTES,
        }
    }

    /// Lock memory, prefault the stack, pin the thread and raise its priority.
    ///
    /// Without the `rt` feature only the stack prefault runs.
    pub fn apply(&self) -> Result<(), CycleError> {
        lock_memory()?;
        prefault_stack(self.prefault_bytes);
        pin_to_core(self.cpu_core)?;
        set_fifo_priority(self.priority)?;
        debug!(
            "RT placement applied: core {}, prio {}, {} KiB stack prefaulted",
            self.cpu_core,
            self.priority,
            self.prefault_bytes / 1024
        );
        Ok(())
    }
}

/// Touch `bytes` of stack (capped at the largest placement) in 4 KiB frames.
fn prefault_stack(bytes: usize) {
    const PAGE: usize = 4096;
    const CAP: usize = PREFAULT_BASE_BYTES + MAX_JOINTS * PREFAULT_PER_JOINT_BYTES;
    let mut frame = [0u8; CAP];
    for page in frame[..bytes.min(CAP)].chunks_mut(PAGE) {
        page.fill(0xA5);
    }
    core::hint::black_box(&frame);
}

#[cfg(feature = "rt")]
fn lock_memory() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall: {e}")))
}

#[cfg(feature = "rt")]
fn pin_to_core(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpus = CpuSet::new();
    cpus.set(cpu)
        .and_then(|()| sched_setaffinity(Pid::from_raw(0), &cpus))
        .map_err(|e| CycleError::RtSetup(format!("pin to core {cpu}: {e}")))
}

#[cfg(feature = "rt")]
fn set_fifo_priority(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param for the duration of the call.
    if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!("SCHED_FIFO prio {priority}: {err}")));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn lock_memory() -> Result<(), CycleError> {
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn pin_to_core(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn set_fifo_priority(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the limiter and its ports and drives them once per tick.
pub struct CycleRunner<S, O, A> {
    limiter: ThermalLimiter,
    controllers: Vec<TwoDofController>,
    lifecycle: Lifecycle,
    source: S,
    sink: O,
    alert: A,
    sample: CycleSample,
    output: TauMaxOutput,
    stats: CycleStats,
    cycle_time_ns: i64,
}

impl<S, O, A> CycleRunner<S, O, A>
where
    S: SampleSource,
    O: OutputSink,
    A: AlertSignaler,
{
    /// Build the thermal store, limiter and controller bank from `loaded`.
    ///
    /// The runner is left in `Ready`.
    ///
    /// # Errors
    /// `InitError::Config` if a per-joint parameter is invalid.
    pub fn new(loaded: &LoadedConfig, source: S, sink: O, alert: A) -> Result<Self, InitError> {
        let config = &loaded.config;
        let hard_limits = loaded.topology.hard_limits();
        let n = hard_limits.len();

        let params = resolve_thermal_params(config, &hard_limits)?;
        let store = Arc::new(ThermalStore::new(params));
        let limiter = ThermalLimiter::new(
            store,
            hard_limits,
            config.thermo_limiter_term,
            config.debug_level,
        );
        let controllers = controller_bank(&resolve_controller_params(config, n));

        let mut lifecycle = Lifecycle::new();
        apply(&mut lifecycle, LifecycleEvent::Initialize)?;
        info!("thermo limiter ready: {n} joints, dt={}s", config.dt);

        Ok(Self {
            limiter,
            controllers,
            lifecycle,
            source,
            sink,
            alert,
            sample: CycleSample::default(),
            output: TauMaxOutput::with_joints(n),
            stats: CycleStats::new(),
            cycle_time_ns: (config.dt * 1e9) as i64,
        })
    }

    /// Start executing cycles.
    pub fn activate(&mut self) -> Result<(), InitError> {
        apply(&mut self.lifecycle, LifecycleEvent::Activate)?;
        info!("thermo limiter activated");
        Ok(())
    }

    /// Stop executing cycles. The alert is switched off.
    pub fn deactivate(&mut self) -> Result<(), InitError> {
        apply(&mut self.lifecycle, LifecycleEvent::Deactivate)?;
        self.alert.set_alert(false);
        info!("thermo limiter deactivated");
        Ok(())
    }

    /// Run one cycle.
    ///
    /// Returns `None` when not `Running`, otherwise whether any joint is in
    /// thermal error. The output is published every running cycle.
    pub fn step(&mut self) -> Option<bool> {
        if !self.lifecycle.is_running() {
            return None;
        }

        self.source.read(&mut self.sample);
        let is_temp_error = self.limiter.limit_temperature(&self.sample);
        self.alert.set_alert(is_temp_error);

        self.limiter.store().copy_tau_max(&mut self.output.data);
        self.output.tm = SystemTime::now();
        self.sink.write(&self.output);

        Some(is_temp_error)
    }

    /// Pace [`step`](Self::step) at `dt` until `running` is cleared or
    /// `max_cycles` cycles have run.
    ///
    /// # Errors
    /// `CycleError::NotRunning` if the runner was not activated.
    pub fn run(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        if !self.lifecycle.is_running() {
            return Err(CycleError::NotRunning(self.lifecycle.state()));
        }
        info!(
            "entering cycle loop: {}ns period{}",
            self.cycle_time_ns,
            max_cycles.map(|n| format!(", {n} cycles")).unwrap_or_default()
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(running, max_cycles);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(running, max_cycles);

        info!(
            "cycle loop exited: {} cycles, avg {}ns, max {}ns, {} overruns",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns
        );
        result
    }

    fn should_continue(&self, running: &AtomicBool, max_cycles: Option<u64>) -> bool {
        running.load(Ordering::Relaxed)
            && max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    fn record_cycle(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.cycle_time_ns {
            self.stats.overruns += 1;
            if self.stats.overruns == 1 || self.stats.overruns % 1000 == 0 {
                warn!(
                    "cycle overrun: {duration_ns}ns > {}ns budget ({} total)",
                    self.cycle_time_ns, self.stats.overruns
                );
            }
        }
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake =
            clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;

        while self.should_continue(running, max_cycles) {
            let deadline = next_wake;
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start =
                clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;
            self.step();
            let cycle_end =
                clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            let latency_ns = timespec_diff_ns(&cycle_start, &deadline).max(0);
            self.record_cycle(duration_ns, latency_ns);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns.max(0) as u64);
        let mut next_wake = Instant::now();

        while self.should_continue(running, max_cycles) {
            next_wake += period;
            let cycle_start = Instant::now();
            self.step();
            let duration_ns = cycle_start.elapsed().as_nanos() as i64;
            self.record_cycle(duration_ns, 0);

            let now = Instant::now();
            if next_wake > now {
                std::thread::sleep(next_wake - now);
            } else {
                next_wake = now;
            }
        }
        debug!("sim loop stopped");
        Ok(())
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Shared thermal store.
    pub fn store(&self) -> &Arc<ThermalStore> {
        self.limiter.store()
    }

    /// Query service over this runner's store.
    pub fn service(&self) -> ThermoLimiterServiceImpl {
        ThermoLimiterServiceImpl::new(self.limiter.store())
    }

    /// Per-joint two-DOF torque controllers.
    pub fn controllers(&self) -> &[TwoDofController] {
        &self.controllers
    }

    /// Mutable access to the controller bank.
    pub fn controllers_mut(&mut self) -> &mut [TwoDofController] {
        &mut self.controllers
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Timing statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Last published output.
    pub fn output(&self) -> &TauMaxOutput {
        &self.output
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn alert(&self) -> &A {
        &self.alert
    }
}

fn apply(lifecycle: &mut Lifecycle, event: LifecycleEvent) -> Result<(), InitError> {
    match lifecycle.handle_event(event) {
        TransitionResult::Ok(_) => Ok(()),
        TransitionResult::Rejected(reason) => Err(InitError::Lifecycle {
            state: lifecycle.state(),
            reason,
        }),
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
