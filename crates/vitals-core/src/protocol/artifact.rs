use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::VitalsError;

use super::unix_millis;

/// Profiling output kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Heapdump,
    Cpuprofile,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Heapdump => "heapdump",
            ArtifactKind::Cpuprofile => "cpuprofile",
        }
    }
}

/// Captured heap dump or CPU profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingArtifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub data: Bytes,
    pub captured_at_ms: i64,
}

impl ProfilingArtifact {
    pub fn new(kind: ArtifactKind, data: Bytes) -> Self {
        Self {
            kind,
            data,
            captured_at_ms: unix_millis(),
        }
    }
}

/// Non-fatal failure forwarded to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub code: String,
    pub at_ms: i64,
}

impl From<&VitalsError> for ErrorReport {
    fn from(e: &VitalsError) -> Self {
        Self {
            message: e.to_string(),
            code: e.code().as_str().to_string(),
            at_ms: unix_millis(),
        }
    }
}
