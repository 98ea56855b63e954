//! Payloads handed to the transport.
//!
//! Everything here is plain serde data: the agent builds these values, the
//! transport collaborator decides how they travel. Each payload knows the
//! channel it is published on.

pub mod action;
pub mod artifact;
pub mod status;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use action::{ActionDescriptor, ActionKind};
pub use artifact::{ArtifactKind, ErrorReport, ProfilingArtifact};
pub use status::{AgentOptions, ApmInfo, CpuInfo, ProcessInfo, ServerInfo, StatusSnapshot};

/// Channel carrying the periodic status snapshot.
pub const CHANNEL_STATUS: &str = "status";
/// Channel carrying heap dumps and CPU profiles.
pub const CHANNEL_PROFILINGS: &str = "profilings";
/// Channel carrying non-fatal error reports.
pub const CHANNEL_EXCEPTION: &str = "process:exception";

/// Anything the agent can publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    Status(StatusSnapshot),
    Profiling(ProfilingArtifact),
    Exception(ErrorReport),
}

impl Outbound {
    pub fn channel(&self) -> &'static str {
        match self {
            Outbound::Status(_) => CHANNEL_STATUS,
            Outbound::Profiling(_) => CHANNEL_PROFILINGS,
            Outbound::Exception(_) => CHANNEL_EXCEPTION,
        }
    }
}

impl From<StatusSnapshot> for Outbound {
    fn from(s: StatusSnapshot) -> Self {
        Outbound::Status(s)
    }
}

impl From<ProfilingArtifact> for Outbound {
    fn from(a: ProfilingArtifact) -> Self {
        Outbound::Profiling(a)
    }
}

impl From<ErrorReport> for Outbound {
    fn from(r: ErrorReport) -> Self {
        Outbound::Exception(r)
    }
}

/// Wall clock in milliseconds since the Unix epoch (0 if the clock is before it).
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
