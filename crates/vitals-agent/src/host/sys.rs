use std::sync::Mutex;

use sysinfo::{Pid, ProcessesToUpdate, System};

use vitals_core::error::{Result, VitalsError};

use super::HostProbe;

/// `HostProbe` backed by `sysinfo`.
///
/// Process CPU usage is computed by sysinfo between two refreshes, so the
/// first reading after start is 0 and later readings cover one report period.
pub struct SysinfoHost {
    sys: Mutex<System>,
    pid: Pid,
    cpu_name: String,
    cpu_count: usize,
}

impl SysinfoHost {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let pid = Pid::from_u32(std::process::id());
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let cpu_name = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default();
        let cpu_count = sys.cpus().len();

        Self {
            sys: Mutex::new(sys),
            pid,
            cpu_name,
            cpu_count,
        }
    }

    fn with_process<T>(&self, f: impl FnOnce(&sysinfo::Process) -> T) -> Result<T> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| VitalsError::Internal("sysinfo lock poisoned".into()))?;
        sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        sys.process(self.pid)
            .map(f)
            .ok_or_else(|| VitalsError::Sampling(format!("process {} not found", self.pid)))
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SysinfoHost {
    fn cpu_percent(&self) -> Result<f64> {
        self.with_process(|p| p.cpu_usage() as f64)
    }

    fn cpu_load(&self) -> f64 {
        System::load_average().one
    }

    fn total_mem(&self) -> u64 {
        match self.sys.lock() {
            Ok(mut sys) => {
                sys.refresh_memory();
                sys.total_memory()
            }
            Err(_) => 0,
        }
    }

    fn cpu_name(&self) -> String {
        self.cpu_name.clone()
    }

    fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn process_memory(&self) -> Result<u64> {
        self.with_process(|p| p.memory())
    }

    fn hostname(&self) -> String {
        System::host_name().unwrap_or_else(|| "unknown".to_string())
    }
}
