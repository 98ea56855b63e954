//! Reporting loop: one snapshot per tick, handed to the outbox.

pub mod reporter;

pub use reporter::{Reporter, StatusOverride, AGENT_VERSION};
