//! Metric value holders.
//!
//! A [`Metric`] either stores a settable `f64` (push semantics, updated by the
//! sampler) or wraps a [`Probe`] that is evaluated on every read (pull
//! semantics). The two are variants of one enum so an instance can never have
//! both. Static values live in an `AtomicU64` as `f64` bits: the sampler is the
//! only writer, readers never take a lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalsError};

/// Metric category as reported to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    Metric,
    ActionResult,
}

/// Pull-side value source for function-backed metrics.
pub trait Probe: Send + Sync {
    /// Current value. Must not change the probe's state.
    fn read(&self) -> f64;

    /// Value closing one report cycle. Stateful probes move their baseline
    /// here; the default is a plain read.
    fn commit(&self) -> f64 {
        self.read()
    }
}

impl<F> Probe for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn read(&self) -> f64 {
        self()
    }
}

enum Source {
    Value(AtomicU64),
    Probe(Box<dyn Probe>),
}

/// Named, typed value holder.
pub struct Metric {
    name: String,
    kind: MetricKind,
    unit: String,
    source: Source,
}

impl Metric {
    /// Settable metric, starts at `0.0`.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Metric,
            unit: unit.into(),
            source: Source::Value(AtomicU64::new(0f64.to_bits())),
        }
    }

    /// Function-backed metric: `probe` runs on every read.
    pub fn from_probe(
        name: impl Into<String>,
        unit: impl Into<String>,
        probe: impl Probe + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Metric,
            unit: unit.into(),
            source: Source::Probe(Box::new(probe)),
        }
    }

    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn is_function_backed(&self) -> bool {
        matches!(self.source, Source::Probe(_))
    }

    /// Store a new value. Function-backed metrics reject writes.
    pub fn set(&self, v: f64) -> Result<()> {
        match &self.source {
            Source::Value(cell) => {
                cell.store(v.to_bits(), Ordering::Relaxed);
                Ok(())
            }
            Source::Probe(_) => Err(VitalsError::BadRequest(format!(
                "metric {} is function-backed",
                self.name
            ))),
        }
    }

    /// Current value. Probes are evaluated now but keep their state.
    pub fn value(&self) -> f64 {
        match &self.source {
            Source::Value(cell) => f64::from_bits(cell.load(Ordering::Relaxed)),
            Source::Probe(p) => p.read(),
        }
    }

    pub fn reading(&self) -> MetricReading {
        self.reading_of(self.value())
    }

    /// Reading for a status snapshot. Probes are committed, so rate probes
    /// start their next interval here.
    pub fn commit_reading(&self) -> MetricReading {
        let value = match &self.source {
            Source::Value(cell) => f64::from_bits(cell.load(Ordering::Relaxed)),
            Source::Probe(p) => p.commit(),
        };
        self.reading_of(value)
    }

    fn reading_of(&self, value: f64) -> MetricReading {
        MetricReading {
            value,
            unit: self.unit.clone(),
            kind: self.kind,
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("unit", &self.unit)
            .field("function_backed", &self.is_function_backed())
            .finish()
    }
}

/// Point-in-time view of a metric, embedded in the status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub value: f64,
    pub unit: String,
    pub kind: MetricKind,
}

/// Baseline for a cumulative-since-boot counter.
///
/// `observe` returns `raw - last` and moves the baseline to `raw`. The
/// baseline starts at zero, so the first observation is the raw value itself.
/// A counter reset yields a negative delta; it is passed through unclamped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeltaCounter {
    last: f64,
}

impl DeltaCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, raw: f64) -> f64 {
        let delta = raw - self.last;
        self.last = raw;
        delta
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

/// Probe reporting the increase of a monotonic source since the last commit.
///
/// Unlike [`DeltaCounter`] the baseline is private to the probe and is taken
/// when the probe is built, not at zero. `read` peeks at the running delta;
/// only `commit` moves the baseline.
pub struct RateProbe<F> {
    source: F,
    last: AtomicU64,
}

impl<F> RateProbe<F>
where
    F: Fn() -> u64 + Send + Sync,
{
    pub fn new(source: F) -> Self {
        let baseline = source() as f64;
        Self {
            source,
            last: AtomicU64::new(baseline.to_bits()),
        }
    }
}

impl<F> Probe for RateProbe<F>
where
    F: Fn() -> u64 + Send + Sync,
{
    fn read(&self) -> f64 {
        let current = (self.source)() as f64;
        current - f64::from_bits(self.last.load(Ordering::Relaxed))
    }

    fn commit(&self) -> f64 {
        let current = (self.source)() as f64;
        let prev = f64::from_bits(self.last.swap(current.to_bits(), Ordering::Relaxed));
        current - prev
    }
}
