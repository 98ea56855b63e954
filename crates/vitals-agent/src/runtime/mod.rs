//! Raw runtime and OS counters read by the sampler.
//!
//! Both sources are collaborators: the agent ships process-backed defaults
//! (`ProcessRuntime`, `Rusage`), tests and hosts can plug their own.

pub mod alloc;
pub mod process;
pub mod rusage;

use vitals_core::Result;

pub use alloc::{CountingAllocator, RuntimeStats};
pub use process::ProcessRuntime;
pub use rusage::Rusage;

/// Runtime counters. All but `heap_alloc` are cumulative since start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuntimeCounters {
    /// Completed collection cycles (arena resets, epoch reclamation, ...).
    pub gc_cycles: u64,
    pub mallocs: u64,
    pub frees: u64,
    /// Live heap bytes (absolute).
    pub heap_alloc: u64,
    /// Cumulative collection pause in ns.
    pub pause_total_ns: u64,
}

/// Process resource usage. Reported as absolute values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub voluntary_switches: u64,
    pub involuntary_switches: u64,
    pub soft_page_faults: u64,
    pub hard_page_faults: u64,
}

pub trait RuntimeSource: Send + Sync {
    fn read_counters(&self) -> Result<RuntimeCounters>;

    /// Live async tasks.
    fn live_tasks(&self) -> u64;

    /// Cumulative foreign (FFI) calls.
    fn foreign_calls(&self) -> u64;
}

pub trait ResourceSource: Send + Sync {
    fn read_usage(&self) -> Result<ResourceUsage>;
}
