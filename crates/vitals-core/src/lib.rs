//! vitals core: metric primitives, snapshot/artifact payloads, and error types.
//!
//! This crate defines the data contracts shared by the agent runtime and by
//! transports that consume its output. It carries no runtime dependencies so
//! a transport or collector can reuse the payload types on their own.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `VitalsError`/`Result` so the host process
//! is never taken down by its own telemetry.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod protocol;

/// Shared result type.
pub use error::{Result, VitalsError};
pub use metric::{DeltaCounter, Metric, MetricKind, MetricReading, Probe, RateProbe};
