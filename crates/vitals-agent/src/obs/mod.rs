//! In-process metric registry.
//!
//! Metrics are stored as atomics and read by the reporter once per tick to
//! build the `monitor` block of the status snapshot.

pub mod registry;

pub use registry::CounterRegistry;
