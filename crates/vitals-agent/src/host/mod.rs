//! Host-process introspection collaborator.
//!
//! Point-in-time reads of the process and the machine it runs on. Reads may
//! fail; the reporter downgrades failures to notifier errors.

mod sys;

use vitals_core::Result;

pub use sys::SysinfoHost;

pub trait HostProbe: Send + Sync {
    /// CPU usage of this process, in percent.
    fn cpu_percent(&self) -> Result<f64>;

    /// One-minute load average.
    fn cpu_load(&self) -> f64;

    fn total_mem(&self) -> u64;

    fn cpu_name(&self) -> String;

    fn cpu_count(&self) -> usize;

    /// Resident memory of this process in bytes.
    fn process_memory(&self) -> Result<u64>;

    fn hostname(&self) -> String;
}
