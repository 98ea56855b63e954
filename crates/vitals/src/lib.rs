//! Top-level facade crate for vitals.
//!
//! Re-exports core types and the agent library so users can depend on a single crate.

pub mod core {
    pub use vitals_core::*;
}

pub mod agent {
    pub use vitals_agent::*;
}
