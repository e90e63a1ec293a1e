//! Process resource sampling for health snapshots

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sysinfo::System;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Resident memory of this process
    pub memory_mb: f64,
    /// Global CPU utilisation, 0-100
    pub cpu_percent: f32,
    pub buffered_metrics: usize,
}

pub trait ResourceSampler: Send + Sync {
    /// Sample memory and CPU. `buffered_metrics` is filled in by the monitor.
    fn sample(&self) -> ResourceUsage;
}

/// Samples the current process and host CPU via `sysinfo`
pub struct SystemResourceSampler {
    system: Mutex<System>,
    pid: Option<sysinfo::Pid>,
}

impl std::fmt::Debug for SystemResourceSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResourceSampler")
            .field("pid", &self.pid)
            .finish()
    }
}

impl Default for SystemResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemResourceSampler {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        let mut system = System::new();
        // CPU usage is a delta between refreshes, prime the first one
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            pid,
        }
    }
}

impl ResourceSampler for SystemResourceSampler {
    fn sample(&self) -> ResourceUsage {
        let mut system = self.system.lock();
        system.refresh_cpu();

        let memory_mb = match self.pid {
            Some(pid) if system.refresh_process(pid) => system
                .process(pid)
                .map(|process| process.memory() as f64 / (1024.0 * 1024.0))
                .unwrap_or(0.0),
            _ => 0.0,
        };

        ResourceUsage {
            memory_mb,
            cpu_percent: system.global_cpu_info().cpu_usage(),
            buffered_metrics: 0,
        }
    }
}

/// Sampler returning fixed figures, for tests and hosts without process stats
#[derive(Debug, Clone, Default)]
pub struct FixedResourceSampler(pub ResourceUsage);

impl ResourceSampler for FixedResourceSampler {
    fn sample(&self) -> ResourceUsage {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_sampler_reports_sane_figures() {
        let usage = SystemResourceSampler::new().sample();
        assert!(usage.memory_mb >= 0.0);
        assert!(usage.cpu_percent >= 0.0);
    }

    #[test]
    fn test_fixed_sampler() {
        let usage = ResourceUsage {
            memory_mb: 64.0,
            cpu_percent: 12.5,
            buffered_metrics: 0,
        };
        assert_eq!(FixedResourceSampler(usage.clone()).sample(), usage);
    }
}
