//! Sampler: raw runtime/OS counters -> metric values.
//!
//! Cumulative counters (collection cycles, allocations, frees, pause time) are
//! turned into per-interval deltas through a private [`DeltaCounter`] each;
//! everything else is pushed as the absolute raw value. Task count and the
//! foreign-call rate are function-backed and evaluated when the registry is
//! read, not here.
//!
//! The sampler runs on the reporter task only, so it owns its delta state
//! without locking.

use std::sync::Arc;

use vitals_core::error::Result;
use vitals_core::{DeltaCounter, Metric, RateProbe};

use crate::notify::Notifier;
use crate::obs::CounterRegistry;
use crate::runtime::{ResourceSource, ResourceUsage, RuntimeCounters, RuntimeSource};

/// Metric names published by the sampler.
pub mod names {
    pub const GC_RUNS: &str = "GCRuns/sec";
    pub const MALLOCS: &str = "mallocs/sec";
    pub const FREES: &str = "free/sec";
    pub const HEAP_ALLOC: &str = "heapAlloc";
    pub const PAUSE: &str = "Pause/sec";
    pub const VOLUNTARY_SWITCHES: &str = "VoluntarySwitches";
    pub const INVOLUNTARY_SWITCHES: &str = "InvoluntarySwitches";
    pub const SOFT_PAGE_FAULTS: &str = "SoftPageFaults";
    pub const HARD_PAGE_FAULTS: &str = "HardPageFaults";
    pub const TASKS: &str = "Tasks";
    pub const FOREIGN_CALLS: &str = "ForeignCalls/sec";
}

/// A settable metric fed through its own delta baseline.
struct DeltaMetric {
    metric: Arc<Metric>,
    state: DeltaCounter,
}

impl DeltaMetric {
    fn new(metric: Arc<Metric>) -> Self {
        Self {
            metric,
            state: DeltaCounter::new(),
        }
    }

    fn push(&mut self, raw: u64) -> Result<()> {
        let delta = self.state.observe(raw as f64);
        self.metric.set(delta)
    }
}

pub struct Sampler {
    runtime: Arc<dyn RuntimeSource>,
    resources: Arc<dyn ResourceSource>,
    notifier: Arc<dyn Notifier>,

    gc_runs: DeltaMetric,
    mallocs: DeltaMetric,
    frees: DeltaMetric,
    pause: DeltaMetric,
    heap_alloc: Arc<Metric>,

    voluntary: Arc<Metric>,
    involuntary: Arc<Metric>,
    soft_faults: Arc<Metric>,
    hard_faults: Arc<Metric>,
}

impl Sampler {
    /// Register every internal metric in `registry` and return the sampler
    /// that feeds them.
    pub fn install(
        registry: &CounterRegistry,
        runtime: Arc<dyn RuntimeSource>,
        resources: Arc<dyn ResourceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        use names::*;

        let tasks_src = Arc::clone(&runtime);
        registry.register(Metric::from_probe(TASKS, "tasks", move || {
            tasks_src.live_tasks() as f64
        }))?;

        let ffi_src = Arc::clone(&runtime);
        registry.register(Metric::from_probe(
            FOREIGN_CALLS,
            "calls/sec",
            RateProbe::new(move || ffi_src.foreign_calls()),
        ))?;

        Ok(Self {
            gc_runs: DeltaMetric::new(registry.register(Metric::new(GC_RUNS, "runs"))?),
            mallocs: DeltaMetric::new(registry.register(Metric::new(MALLOCS, "mallocs"))?),
            frees: DeltaMetric::new(registry.register(Metric::new(FREES, "frees"))?),
            pause: DeltaMetric::new(registry.register(Metric::new(PAUSE, "ns/sec"))?),
            heap_alloc: registry.register(Metric::new(HEAP_ALLOC, "bytes"))?,
            voluntary: registry.register(Metric::new(VOLUNTARY_SWITCHES, "switches"))?,
            involuntary: registry.register(Metric::new(INVOLUNTARY_SWITCHES, "switches"))?,
            soft_faults: registry.register(Metric::new(SOFT_PAGE_FAULTS, "faults"))?,
            hard_faults: registry.register(Metric::new(HARD_PAGE_FAULTS, "faults"))?,
            runtime,
            resources,
            notifier,
        })
    }

    /// One sampling pass. A failed read leaves that group's metrics and
    /// baselines untouched; the other group is still sampled.
    pub fn sample(&mut self) {
        match self.runtime.read_counters() {
            Ok(c) => {
                if let Err(e) = self.apply_counters(&c) {
                    self.notifier.error(&e);
                }
            }
            Err(e) => self.notifier.error(&e),
        }

        match self.resources.read_usage() {
            Ok(u) => {
                if let Err(e) = self.apply_usage(&u) {
                    self.notifier.error(&e);
                }
            }
            Err(e) => self.notifier.error(&e),
        }
    }

    fn apply_counters(&mut self, c: &RuntimeCounters) -> Result<()> {
        self.gc_runs.push(c.gc_cycles)?;
        self.mallocs.push(c.mallocs)?;
        self.frees.push(c.frees)?;
        self.pause.push(c.pause_total_ns)?;
        self.heap_alloc.set(c.heap_alloc as f64)?;
        tracing::trace!(heap = c.heap_alloc, mallocs = c.mallocs, "runtime counters sampled");
        Ok(())
    }

    fn apply_usage(&self, u: &ResourceUsage) -> Result<()> {
        self.voluntary.set(u.voluntary_switches as f64)?;
        self.involuntary.set(u.involuntary_switches as f64)?;
        self.soft_faults.set(u.soft_page_faults as f64)?;
        self.hard_faults.set(u.hard_page_faults as f64)?;
        Ok(())
    }
}
