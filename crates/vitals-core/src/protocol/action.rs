use serde::{Deserialize, Serialize};

/// Who registered the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Shipped with the agent (heap dump, CPU profiling).
    Internal,
    /// Registered by the host application.
    Custom,
}

/// Action entry advertised in the status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
}
