use tokio::runtime::Handle;

use vitals_core::Result;

use super::alloc::RuntimeStats;
use super::{RuntimeCounters, RuntimeSource};

/// Runtime counters of the current process: allocator stats plus the tokio
/// runtime the agent was started on.
pub struct ProcessRuntime {
    handle: Option<Handle>,
}

impl ProcessRuntime {
    /// Captures the current tokio runtime, if any.
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }
}

impl Default for ProcessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeSource for ProcessRuntime {
    fn read_counters(&self) -> Result<RuntimeCounters> {
        Ok(RuntimeCounters {
            gc_cycles: RuntimeStats::collections(),
            mallocs: RuntimeStats::mallocs(),
            frees: RuntimeStats::frees(),
            heap_alloc: RuntimeStats::live_bytes(),
            pause_total_ns: RuntimeStats::pause_total_ns(),
        })
    }

    fn live_tasks(&self) -> u64 {
        self.handle
            .as_ref()
            .map(|h| h.metrics().num_alive_tasks() as u64)
            .unwrap_or(0)
    }

    fn foreign_calls(&self) -> u64 {
        RuntimeStats::foreign_calls()
    }
}
