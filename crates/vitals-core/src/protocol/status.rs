//! Status snapshot sent once per reporting tick.
//!
//! Built fresh by the reporter and never mutated after construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metric::MetricReading;

use super::action::ActionDescriptor;

/// Complete point-in-time report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub process: Vec<ProcessInfo>,
    pub server: ServerInfo,
}

/// The monitored process as seen by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub interpreter: String,
    pub restart_time: u32,
    /// Agent start, ms since epoch.
    pub created_at: i64,
    /// Start of the current run, ms since epoch. Equal to `created_at`
    /// while the agent is never restarted in-process.
    pub pm_uptime: i64,
    pub exec_mode: String,
    pub watching: bool,
    pub status: String,
    pub pm_id: u32,
    /// Process CPU usage in percent.
    pub cpu: f64,
    /// Resident memory in bytes.
    pub memory: u64,
    pub node_env: String,
    pub actions: Vec<ActionDescriptor>,
    pub monitor: BTreeMap<String, MetricReading>,
    pub options: AgentOptions,
}

/// Capabilities advertised to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOptions {
    pub heapdump: bool,
    pub profiling: bool,
    pub custom_probes: bool,
    pub apm: ApmInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApmInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

/// Host the process runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// One-minute load average.
    pub loadavg: f64,
    pub total_mem: u64,
    pub hostname: String,
    pub server_name: String,
    /// Time since the agent started, in ms.
    pub uptime_ms: u64,
    pub agent_version: String,
    pub os_type: String,
    pub arch: String,
    pub interaction: bool,
    pub cpu: CpuInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub number: usize,
    pub info: String,
}
