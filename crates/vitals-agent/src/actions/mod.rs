//! Internal diagnostic actions: heap dump and CPU profiling.

mod cpu_profile;
mod heapdump;

pub use cpu_profile::{CpuProfiling, CpuProfilingStart, CpuProfilingStop};
pub use heapdump::HeapDump;

pub const HEAPDUMP: &str = "heapdump";
pub const CPU_PROFILING_START: &str = "cpu-profiling-start";
pub const CPU_PROFILING_STOP: &str = "cpu-profiling-stop";
