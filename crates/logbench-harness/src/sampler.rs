// Dweve Logbench - Log Analytics Benchmark Harness
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background resource sampler.
//!
//! A [`ResourceSampler`] owns one background thread that polls a
//! [`ProcessProbe`] at a fixed interval while the measured workload runs.
//! Its lifecycle is `Idle -> Sampling -> Stopped`:
//!
//! - `start()` is only valid from `Idle` and spawns the thread.
//! - `stop()` raises the stop signal, wakes the thread and joins it. Once it
//!   returns the series is frozen. Stopping twice is a no-op.
//! - `summary()` is only valid once `Stopped`.
//!
//! A probe error or panic during one tick drops that sample and nothing
//! else; the loop keeps running and the caller never sees it.
//!
//! Prefer the scoped forms, [`ResourceSampler::guard`] and
//! [`ResourceSampler::measure`], which stop the thread on every exit path.

use crate::config::DEFAULT_SAMPLE_INTERVAL;
use crate::history::ResourceReport;
use logbench_core::{LogbenchError, Result};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::{trace, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One resource reading of the measured process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// CPU utilisation in percent (may exceed 100 on several cores).
    pub cpu_percent: f64,
    /// Resident set size in bytes.
    pub rss_bytes: u64,
    /// Cumulative bytes read since process start.
    pub read_bytes: u64,
    /// Cumulative bytes written since process start.
    pub write_bytes: u64,
}

/// Ordered, append-only list of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Samples in acquisition order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing was sampled.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<Sample> for SampleSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Reduction of a [`SampleSeries`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSummary {
    /// Mean CPU percent, 0 with no samples.
    pub cpu_percent_avg: f64,
    /// Peak RSS in bytes, 0 with no samples.
    pub rss_max_bytes: u64,
    /// Bytes read between first and last sample.
    pub read_bytes_delta: u64,
    /// Bytes written between first and last sample.
    pub write_bytes_delta: u64,
    /// Number of samples reduced.
    pub sample_count: u64,
}

impl ResourceSummary {
    /// Summarises a series.
    ///
    /// I/O deltas are `last - first`, saturating at zero, and zero when
    /// fewer than two samples exist.
    pub fn from_series(series: &SampleSeries) -> Self {
        let samples = series.samples();
        let sample_count = samples.len() as u64;

        let cpu_percent_avg = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.cpu_percent).sum::<f64>() / samples.len() as f64
        };
        let rss_max_bytes = samples.iter().map(|s| s.rss_bytes).max().unwrap_or(0);

        let (read_bytes_delta, write_bytes_delta) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) if samples.len() >= 2 => (
                last.read_bytes.saturating_sub(first.read_bytes),
                last.write_bytes.saturating_sub(first.write_bytes),
            ),
            _ => (0, 0),
        };

        Self {
            cpu_percent_avg,
            rss_max_bytes,
            read_bytes_delta,
            write_bytes_delta,
            sample_count,
        }
    }

    /// Peak RSS in MiB.
    pub fn rss_mb_max(&self) -> f64 {
        self.rss_max_bytes as f64 / BYTES_PER_MB
    }

    /// External summary shape persisted with every run.
    pub fn report(&self) -> ResourceReport {
        ResourceReport {
            cpu_percent_avg: self.cpu_percent_avg,
            rss_mb_max: self.rss_mb_max(),
            read_bytes: self.read_bytes_delta,
            write_bytes: self.write_bytes_delta,
            samples: self.sample_count,
        }
    }
}

/// A single failed reading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// The process is no longer visible to the probe.
    #[error("process {0} is not visible")]
    ProcessGone(u32),

    /// The platform cannot provide process statistics.
    #[error("process statistics unavailable: {0}")]
    Unsupported(String),
}

/// Source of resource readings.
///
/// The sampler thread owns the probe exclusively while sampling.
pub trait ProcessProbe: Send + 'static {
    /// Takes one complete reading.
    fn sample(&mut self) -> std::result::Result<Sample, ProbeError>;
}

/// [`ProcessProbe`] over the `sysinfo` process table.
pub struct SysinfoProbe {
    system: System,
    pid: Pid,
}

impl SysinfoProbe {
    /// Probe for the calling process.
    pub fn current_process() -> std::result::Result<Self, ProbeError> {
        let pid = sysinfo::get_current_pid().map_err(|e| ProbeError::Unsupported(e.to_string()))?;
        Ok(Self::for_pid(pid))
    }

    /// Probe for an arbitrary process.
    pub fn for_pid(pid: Pid) -> Self {
        let mut probe = Self {
            system: System::new(),
            pid,
        };
        // CPU usage is a delta between refreshes; the first one only primes it.
        probe.refresh();
        probe
    }

    fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_disk_usage(),
        );
    }
}

impl ProcessProbe for SysinfoProbe {
    fn sample(&mut self) -> std::result::Result<Sample, ProbeError> {
        self.refresh();
        let process = self
            .system
            .process(self.pid)
            .ok_or(ProbeError::ProcessGone(self.pid.as_u32()))?;

        let cpu = process.cpu_usage();
        let disk = process.disk_usage();
        Ok(Sample {
            cpu_percent: if cpu.is_finite() { f64::from(cpu) } else { 0.0 },
            rss_bytes: process.memory(),
            read_bytes: disk.total_read_bytes,
            write_bytes: disk.total_written_bytes,
        })
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Created, not started.
    Idle,
    /// Background thread running.
    Sampling,
    /// Thread joined, series frozen.
    Stopped,
}

/// Stop flag the sampler thread can sleep on.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    fn is_raised(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleeps for `timeout` or until raised. Returns whether it was raised.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

enum Phase {
    Idle(Box<dyn ProcessProbe>),
    Sampling {
        signal: Arc<StopSignal>,
        handle: JoinHandle<SampleSeries>,
    },
    Stopped(SampleSeries),
    // Only observable while a transition is in progress.
    Transition,
}

/// Samples one process on a background thread.
///
/// # Example
///
/// ```rust,no_run
/// use logbench_harness::ResourceSampler;
/// use std::time::Duration;
///
/// # fn main() -> logbench_core::Result<()> {
/// let (sum, summary) = ResourceSampler::measure(Duration::from_millis(100), || {
///     (0..10_000_000u64).sum::<u64>()
/// })?;
/// println!("{} in {} samples, peak {:.1} MiB", sum, summary.sample_count, summary.rss_mb_max());
/// # Ok(())
/// # }
/// ```
pub struct ResourceSampler {
    interval: Duration,
    phase: Phase,
}

impl std::fmt::Debug for ResourceSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSampler")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}

impl ResourceSampler {
    /// Sampler for the current process.
    pub fn new(interval: Duration) -> Result<Self> {
        let probe = SysinfoProbe::current_process()
            .map_err(|e| LogbenchError::InvalidState(format!("resource probe unavailable: {}", e)))?;
        Self::with_probe(probe, interval)
    }

    /// Sampler with the default 500 ms interval.
    pub fn with_default_interval() -> Result<Self> {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }

    /// Sampler over a caller-supplied probe.
    pub fn with_probe<P: ProcessProbe>(probe: P, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(LogbenchError::invalid_config(
                "sample_interval",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            interval,
            phase: Phase::Idle(Box::new(probe)),
        })
    }

    /// Sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SamplerState {
        match self.phase {
            Phase::Idle(_) => SamplerState::Idle,
            Phase::Sampling { .. } => SamplerState::Sampling,
            Phase::Stopped(_) | Phase::Transition => SamplerState::Stopped,
        }
    }

    /// Spawns the sampling thread.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the sampler is `Idle`.
    pub fn start(&mut self) -> Result<()> {
        let probe = match std::mem::replace(&mut self.phase, Phase::Transition) {
            Phase::Idle(probe) => probe,
            other => {
                let state = describe(&other);
                self.phase = other;
                return Err(LogbenchError::InvalidState(format!(
                    "cannot start a sampler that is {}",
                    state
                )));
            }
        };

        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let interval = self.interval;

        let spawned = thread::Builder::new()
            .name("logbench-sampler".to_string())
            .spawn(move || sampling_loop(probe, &thread_signal, interval));

        match spawned {
            Ok(handle) => {
                self.phase = Phase::Sampling { signal, handle };
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Stopped(SampleSeries::new());
                Err(LogbenchError::InvalidState(format!(
                    "failed to spawn sampler thread: {}",
                    e
                )))
            }
        }
    }

    /// Stops and joins the sampling thread.
    ///
    /// No sample is appended after this returns. Calling it again once
    /// stopped is a no-op.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the sampler was never started.
    pub fn stop(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.phase, Phase::Transition) {
            Phase::Sampling { signal, handle } => {
                signal.raise();
                let series = handle.join().unwrap_or_else(|_| {
                    warn!("sampler thread panicked; discarding its samples");
                    SampleSeries::new()
                });
                trace!(samples = series.len(), "sampler stopped");
                self.phase = Phase::Stopped(series);
                Ok(())
            }
            stopped @ Phase::Stopped(_) => {
                self.phase = stopped;
                Ok(())
            }
            other => {
                self.phase = other;
                Err(LogbenchError::InvalidState(
                    "cannot stop a sampler that was never started".to_string(),
                ))
            }
        }
    }

    /// The frozen series, once stopped.
    pub fn series(&self) -> Option<&SampleSeries> {
        match &self.phase {
            Phase::Stopped(series) => Some(series),
            _ => None,
        }
    }

    /// Summary of the frozen series.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the sampler is `Stopped`.
    pub fn summary(&self) -> Result<ResourceSummary> {
        self.series()
            .map(ResourceSummary::from_series)
            .ok_or_else(|| {
                LogbenchError::InvalidState(format!(
                    "summary requested while sampler is {}",
                    describe(&self.phase)
                ))
            })
    }

    /// Starts sampling and returns a guard that stops it when dropped.
    pub fn guard(&mut self) -> Result<SamplerGuard<'_>> {
        self.start()?;
        Ok(SamplerGuard { sampler: self })
    }

    /// Runs `f` under a sampler for the current process.
    ///
    /// The summary is returned whatever `f` returns, including an `Err`.
    pub fn measure<T, F>(interval: Duration, f: F) -> Result<(T, ResourceSummary)>
    where
        F: FnOnce() -> T,
    {
        let mut sampler = Self::new(interval)?;
        sampler.run(f)
    }

    /// Runs `f` between `start` and `stop` of this sampler.
    pub fn run<T, F>(&mut self, f: F) -> Result<(T, ResourceSummary)>
    where
        F: FnOnce() -> T,
    {
        let guard = self.guard()?;
        let output = f();
        let summary = guard.finish()?;
        Ok((output, summary))
    }
}

impl Drop for ResourceSampler {
    fn drop(&mut self) {
        if self.state() == SamplerState::Sampling {
            let _ = self.stop();
        }
    }
}

/// Scoped sampling: the thread is stopped and joined when the guard goes
/// out of scope, including on early return and panic.
pub struct SamplerGuard<'a> {
    sampler: &'a mut ResourceSampler,
}

impl SamplerGuard<'_> {
    /// Stops sampling and returns the summary.
    pub fn finish(self) -> Result<ResourceSummary> {
        self.sampler.stop()?;
        self.sampler.summary()
    }
}

impl Drop for SamplerGuard<'_> {
    fn drop(&mut self) {
        if self.sampler.state() == SamplerState::Sampling {
            let _ = self.sampler.stop();
        }
    }
}

fn describe(phase: &Phase) -> &'static str {
    match phase {
        Phase::Idle(_) => "idle",
        Phase::Sampling { .. } => "sampling",
        Phase::Stopped(_) | Phase::Transition => "stopped",
    }
}

fn sampling_loop(
    mut probe: Box<dyn ProcessProbe>,
    signal: &StopSignal,
    interval: Duration,
) -> SampleSeries {
    let mut series = SampleSeries::new();

    while !signal.is_raised() {
        match panic::catch_unwind(AssertUnwindSafe(|| probe.sample())) {
            Ok(Ok(sample)) => series.push(sample),
            Ok(Err(e)) => trace!(error = %e, "sample skipped"),
            Err(_) => trace!("sample skipped: probe panicked"),
        }
        if signal.wait(interval) {
            break;
        }
    }

    series
}
