use serde::Deserialize;
use vitals_core::error::{Result, VitalsError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    pub agent: AgentSection,

    #[serde(default)]
    pub profiling: ProfilingSection,
}

impl AgentConfig {
    /// Config for hosts that build it in code instead of loading YAML.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: 1,
            agent: AgentSection::new(name),
            profiling: ProfilingSection::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VitalsError::Unsupported(format!(
                "config version {}",
                self.version
            )));
        }

        self.agent.validate()?;
        self.profiling.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    /// Process name shown by the collector.
    pub name: String,

    /// Falls back to the host name when unset.
    #[serde(default)]
    pub server_name: Option<String>,

    /// Remote collector host. Opaque to the agent, handed to transports.
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_node_env")]
    pub node_env: String,

    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

impl AgentSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_name: None,
            node: default_node(),
            node_env: default_node_env(),
            report_interval_ms: default_report_interval_ms(),
            outbox_capacity: default_outbox_capacity(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VitalsError::BadRequest("agent.name must not be empty".into()));
        }
        if !(100..=60000).contains(&self.report_interval_ms) {
            return Err(VitalsError::BadRequest(
                "agent.report_interval_ms must be between 100 and 60000".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbox_capacity) {
            return Err(VitalsError::BadRequest(
                "agent.outbox_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_node() -> String {
    "collector.local".into()
}
fn default_node_env() -> String {
    "production".into()
}
fn default_report_interval_ms() -> u64 {
    1000
}
fn default_outbox_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilingSection {
    #[serde(default = "default_true")]
    pub heapdump: bool,

    #[serde(default = "default_true")]
    pub cpu: bool,

    /// Upper bound accepted for `opts.timeout` on `cpu-profiling-start`.
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,
}

impl Default for ProfilingSection {
    fn default() -> Self {
        Self {
            heapdump: true,
            cpu: true,
            max_timeout_ms: default_max_timeout_ms(),
        }
    }
}

impl ProfilingSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3_600_000).contains(&self.max_timeout_ms) {
            return Err(VitalsError::BadRequest(
                "profiling.max_timeout_ms must be between 1 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_max_timeout_ms() -> u64 {
    300000
}
