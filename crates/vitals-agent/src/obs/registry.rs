//! Counter registry: the live metric table read once per report cycle.
//!
//! Owned by the agent and shared through `Arc`; there is no process-global
//! instance. Registration happens at start (and for host probes later on),
//! values are written only by the sampler task.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use vitals_core::error::{Result, VitalsError};
use vitals_core::{Metric, MetricReading};

#[derive(Default)]
pub struct CounterRegistry {
    metrics: DashMap<String, Arc<Metric>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self {
            metrics: DashMap::new(),
        }
    }

    /// Register a metric and return the shared handle. Names are unique.
    pub fn register(&self, metric: Metric) -> Result<Arc<Metric>> {
        let name = metric.name().to_string();
        let entry = self.metrics.entry(name);
        match entry {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(VitalsError::BadRequest(format!(
                "metric already registered: {}",
                e.key()
            ))),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let m = Arc::new(metric);
                e.insert(Arc::clone(&m));
                Ok(m)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.get(name).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// name -> current value. Function-backed metrics are evaluated here but
    /// keep their state, so calling this never changes a later snapshot.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.handles()
            .into_iter()
            .map(|m| (m.name().to_string(), m.value()))
            .collect()
    }

    /// name -> reading (value, unit, kind), without committing probes.
    pub fn readings(&self) -> BTreeMap<String, MetricReading> {
        self.handles()
            .into_iter()
            .map(|m| (m.name().to_string(), m.reading()))
            .collect()
    }

    /// Readings for one status snapshot. Commits every probe; call once per
    /// report cycle.
    pub fn commit_readings(&self) -> BTreeMap<String, MetricReading> {
        self.handles()
            .into_iter()
            .map(|m| (m.name().to_string(), m.commit_reading()))
            .collect()
    }

    // Probes run on the returned handles, not under shard locks.
    fn handles(&self) -> Vec<Arc<Metric>> {
        self.metrics.iter().map(|r| Arc::clone(r.value())).collect()
    }
}
