//! Cycle input/output ports.
//!
//! The transport that delivers samples and ships torque ceilings is external.
//! These traits are the seam; the implementations here cover in-process use
//! (channels, simulation, logging).

use std::sync::mpsc::{Receiver, TryRecvError};

use thermo_common::thermal::{CycleSample, TauMaxOutput};
use tracing::{debug, warn};

/// Source of per-cycle input samples.
pub trait SampleSource {
    /// Overwrite `sample` with any data that arrived since the last call.
    ///
    /// Stale fields are left as they are. Returns `true` if anything changed.
    fn read(&mut self, sample: &mut CycleSample) -> bool;
}

/// Destination of the per-cycle torque ceilings.
pub trait OutputSink {
    /// Publish one cycle's output.
    fn write(&mut self, output: &TauMaxOutput);
}

// ─── Channel Source ─────────────────────────────────────────────────

/// Samples pushed by another thread; only the newest pending one is used.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<CycleSample>,
    disconnected: bool,
}

impl ChannelSource {
    /// Source draining `rx`.
    pub fn new(rx: Receiver<CycleSample>) -> Self {
        Self {
            rx,
            disconnected: false,
        }
    }
}

impl SampleSource for ChannelSource {
    fn read(&mut self, sample: &mut CycleSample) -> bool {
        let mut updated = false;
        loop {
            match self.rx.try_recv() {
                Ok(newest) => {
                    *sample = newest;
                    updated = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("sample channel disconnected; holding last sample");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        updated
    }
}

// ─── Simulated Motors ───────────────────────────────────────────────

/// First-order motor temperature simulation driven by a fixed torque load.
///
/// `dT/dt = heat_gain · tau² − (T − ambient) / time_constant`
#[derive(Debug, Clone)]
pub struct SimulatedMotors {
    temperature: Vec<f64>,
    tau: Vec<f64>,
    ambient: f64,
    heat_gain: f64,
    time_constant: f64,
    dt: f64,
}

impl SimulatedMotors {
    /// `n` motors at `ambient`, unloaded, stepping by `dt` per read.
    pub fn new(n: usize, ambient: f64, dt: f64) -> Self {
        Self {
            temperature: vec![ambient; n],
            tau: vec![0.0; n],
            ambient,
            heat_gain: 0.05,
            time_constant: 600.0,
            dt,
        }
    }

    /// Set the torque load of every motor.
    pub fn with_load(mut self, tau: f64) -> Self {
        self.tau.iter_mut().for_each(|t| *t = tau);
        self
    }

    /// Set heating gain and cooling time constant [s].
    pub fn with_thermal(mut self, heat_gain: f64, time_constant: f64) -> Self {
        self.heat_gain = heat_gain;
        self.time_constant = time_constant;
        self
    }

    /// Current simulated temperatures.
    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }
}

impl SampleSource for SimulatedMotors {
    fn read(&mut self, sample: &mut CycleSample) -> bool {
        for (temp, &tau) in self.temperature.iter_mut().zip(&self.tau) {
            let heating = self.heat_gain * tau * tau;
            let cooling = if self.time_constant > 0.0 {
                (*temp - self.ambient) / self.time_constant
            } else {
                0.0
            };
            *temp += (heating - cooling) * self.dt;
        }
        sample.temperature.clone_from(&self.temperature);
        sample.tau.clone_from(&self.tau);
        sample.current.clone_from(&self.tau);
        true
    }
}

// ─── Log Sink ───────────────────────────────────────────────────────

/// Sink that traces the output every `interval` writes.
#[derive(Debug, Clone)]
pub struct LogSink {
    interval: u64,
    writes: u64,
    last: Option<TauMaxOutput>,
}

impl LogSink {
    /// Trace every `interval` writes (0 = never).
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            writes: 0,
            last: None,
        }
    }

    /// Number of outputs written.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Last output written.
    pub fn last(&self) -> Option<&TauMaxOutput> {
        self.last.as_ref()
    }
}

impl OutputSink for LogSink {
    fn write(&mut self, output: &TauMaxOutput) {
        self.writes += 1;
        if self.interval > 0 && self.writes % self.interval == 0 {
            debug!(tau_max = ?output.data, tm = ?output.tm, "tauMax out");
        }
        match self.last.as_mut() {
            Some(last) => last.clone_from(output),
            None => self.last = Some(output.clone()),
        }
    }
}
