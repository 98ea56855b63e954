//! Profiler collaborator.

mod summary;

use bytes::Bytes;

use vitals_core::Result;

pub use summary::RusageProfiler;

/// Captures CPU profiles and heap dumps. Calls are short and synchronous.
pub trait Profiler: Send + Sync {
    fn start_cpu_profile(&self) -> Result<()>;

    /// Stop the running profile and return what was recorded.
    fn stop_cpu_profile(&self) -> Result<Bytes>;

    fn heap_dump(&self) -> Result<Bytes>;
}
