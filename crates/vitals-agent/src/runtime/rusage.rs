use vitals_core::error::{Result, VitalsError};

use super::{ResourceSource, ResourceUsage};

/// `getrusage(RUSAGE_SELF)` reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rusage;

/// Raw rusage fields the agent cares about.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RusageSample {
    pub user_us: u64,
    pub system_us: u64,
    pub usage: ResourceUsage,
}

impl Rusage {
    #[cfg(unix)]
    pub fn sample() -> Result<RusageSample> {
        // SAFETY: `rusage` is plain old data; getrusage fills it completely on success.
        let mut ru: libc::rusage = unsafe { std::mem::zeroed() };
        // SAFETY: valid pointer to a properly sized struct.
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut ru) };
        if rc != 0 {
            return Err(VitalsError::Sampling(format!(
                "getrusage failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        let tv_us = |tv: libc::timeval| tv.tv_sec as u64 * 1_000_000 + tv.tv_usec as u64;

        Ok(RusageSample {
            user_us: tv_us(ru.ru_utime),
            system_us: tv_us(ru.ru_stime),
            usage: ResourceUsage {
                voluntary_switches: ru.ru_nvcsw as u64,
                involuntary_switches: ru.ru_nivcsw as u64,
                soft_page_faults: ru.ru_minflt as u64,
                hard_page_faults: ru.ru_majflt as u64,
            },
        })
    }

    #[cfg(not(unix))]
    pub fn sample() -> Result<RusageSample> {
        Err(VitalsError::Unsupported("getrusage is unix-only".into()))
    }
}

impl ResourceSource for Rusage {
    fn read_usage(&self) -> Result<ResourceUsage> {
        Rusage::sample().map(|s| s.usage)
    }
}
