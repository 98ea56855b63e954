//! Dependency-free profiler: resource-usage summaries instead of stack samples.
//!
//! A CPU "profile" is the user/system CPU time, context switches and page
//! faults spent between start and stop. A heap dump is the allocator counter
//! set at capture time. Both are encoded as JSON.

use std::sync::Mutex;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;

use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::unix_millis;

use crate::runtime::rusage::{Rusage, RusageSample};
use crate::runtime::RuntimeStats;

use super::Profiler;

struct Window {
    started: Instant,
    started_at_ms: i64,
    at_start: RusageSample,
}

#[derive(Serialize)]
struct CpuSummary {
    started_at_ms: i64,
    wall_ms: u64,
    user_us: u64,
    system_us: u64,
    voluntary_switches: u64,
    involuntary_switches: u64,
    soft_page_faults: u64,
    hard_page_faults: u64,
}

#[derive(Serialize)]
struct HeapSummary {
    captured_at_ms: i64,
    mallocs: u64,
    frees: u64,
    live_objects: u64,
    live_bytes: u64,
    collections: u64,
    pause_total_ns: u64,
}

#[derive(Default)]
pub struct RusageProfiler {
    window: Mutex<Option<Window>>,
}

impl RusageProfiler {
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode<T: Serialize>(v: &T) -> Result<Bytes> {
    serde_json::to_vec(v)
        .map(Bytes::from)
        .map_err(|e| VitalsError::Profiling(format!("encode failed: {e}")))
}

impl Profiler for RusageProfiler {
    fn start_cpu_profile(&self) -> Result<()> {
        let mut w = self
            .window
            .lock()
            .map_err(|_| VitalsError::Internal("profiler lock poisoned".into()))?;
        if w.is_some() {
            return Err(VitalsError::ProfilerBusy);
        }
        *w = Some(Window {
            started: Instant::now(),
            started_at_ms: unix_millis(),
            at_start: Rusage::sample()?,
        });
        Ok(())
    }

    fn stop_cpu_profile(&self) -> Result<Bytes> {
        let window = self
            .window
            .lock()
            .map_err(|_| VitalsError::Internal("profiler lock poisoned".into()))?
            .take()
            .ok_or_else(|| VitalsError::Profiling("no cpu profile running".into()))?;

        let end = Rusage::sample()?;
        let a = window.at_start;
        encode(&CpuSummary {
            started_at_ms: window.started_at_ms,
            wall_ms: window.started.elapsed().as_millis() as u64,
            user_us: end.user_us.saturating_sub(a.user_us),
            system_us: end.system_us.saturating_sub(a.system_us),
            voluntary_switches: end
                .usage
                .voluntary_switches
                .saturating_sub(a.usage.voluntary_switches),
            involuntary_switches: end
                .usage
                .involuntary_switches
                .saturating_sub(a.usage.involuntary_switches),
            soft_page_faults: end
                .usage
                .soft_page_faults
                .saturating_sub(a.usage.soft_page_faults),
            hard_page_faults: end
                .usage
                .hard_page_faults
                .saturating_sub(a.usage.hard_page_faults),
        })
    }

    fn heap_dump(&self) -> Result<Bytes> {
        let mallocs = RuntimeStats::mallocs();
        let frees = RuntimeStats::frees();
        encode(&HeapSummary {
            captured_at_ms: unix_millis(),
            mallocs,
            frees,
            live_objects: mallocs.saturating_sub(frees),
            live_bytes: RuntimeStats::live_bytes(),
            collections: RuntimeStats::collections(),
            pause_total_ns: RuntimeStats::pause_total_ns(),
        })
    }
}
