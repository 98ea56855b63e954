//! vitals agent library entry.
//!
//! This crate wires the sampler, the counter registry, the reporting loop, and
//! the action dispatcher into an agent that runs inside the monitored process.
//! It is consumed by the binary (`main.rs`), by host applications, and by
//! integration tests.

pub mod actions;
pub mod agent;
pub mod config;
pub mod dispatch;
pub mod host;
pub mod notify;
pub mod obs;
pub mod profiler;
pub mod report;
pub mod runtime;
pub mod sampler;
pub mod transport;

pub use agent::{AgentBuilder, AgentHandle};
