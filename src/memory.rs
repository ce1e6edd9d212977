//! Memory footprint monitoring and budgeting.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SortError;

/// Reports the current memory footprint of the process.
pub trait MemoryMonitor: Send + Sync {
    /// Returns the current footprint in bytes.
    fn footprint(&self) -> u64;
}

/// Deterministic monitor simulating footprint growth: every query reports `step` bytes more than the previous one.
pub struct SimulatedMemoryMonitor {
    base: u64,
    step: u64,
    queries: AtomicU64,
}

impl SimulatedMemoryMonitor {
    pub fn new(base: u64, step: u64) -> Self {
        SimulatedMemoryMonitor {
            base,
            step,
            queries: AtomicU64::new(0),
        }
    }

    /// Creates a monitor reporting the same footprint on every query.
    pub fn constant(base: u64) -> Self {
        Self::new(base, 0)
    }

    /// Returns the number of footprint queries made so far.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

impl MemoryMonitor for SimulatedMemoryMonitor {
    fn footprint(&self) -> u64 {
        let n = self.queries.fetch_add(1, Ordering::Relaxed);
        self.base.saturating_add(self.step.saturating_mul(n))
    }
}

/// Memory budget in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryBudget(u64);

impl MemoryBudget {
    pub fn new(bytes: u64) -> Self {
        MemoryBudget(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Checks that the budget exceeds the current footprint by at least one byte.
    pub fn check(&self, monitor: &dyn MemoryMonitor) -> Result<(), SortError> {
        let footprint = monitor.footprint();
        if self.0 <= footprint {
            return Err(SortError::BudgetTooSmall {
                required: footprint.saturating_add(1),
            });
        }

        log::debug!("memory budget {} bytes, current footprint {} bytes", self.0, footprint);
        return Ok(());
    }

    /// Checks whether `bytes` more can be held on top of `footprint`.
    pub fn admits(&self, footprint: u64, bytes: u64) -> bool {
        footprint.saturating_add(bytes) <= self.0
    }
}

#[cfg(feature = "process-memory")]
pub mod process {
    use std::sync::Mutex;

    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    use super::MemoryMonitor;
    use crate::error::SortError;

    /// Number of footprint queries answered from one OS sample by default.
    pub const DEFAULT_SAMPLE_EVERY: u32 = 1024;

    struct Sampler {
        system: System,
        cached: u64,
        remaining: u32,
    }

    /// Monitor reporting the resident set size of the current process.
    /// Reading process statistics is a system call, so one sample is reused for `sample_every` queries.
    pub struct ProcessMemoryMonitor {
        pid: Pid,
        sample_every: u32,
        sampler: Mutex<Sampler>,
    }

    impl ProcessMemoryMonitor {
        /// Creates a monitor for the current process.
        /// Fails with [`SortError::MemoryMonitor`] on platforms sysinfo does not support.
        pub fn new(sample_every: u32) -> Result<Self, SortError> {
            let pid = sysinfo::get_current_pid().map_err(SortError::MemoryMonitor)?;

            return Ok(ProcessMemoryMonitor {
                pid,
                sample_every: sample_every.max(1),
                sampler: Mutex::new(Sampler {
                    system: System::new(),
                    cached: 0,
                    remaining: 0,
                }),
            });
        }

        fn sample(&self, system: &mut System) -> u64 {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[self.pid]),
                true,
                ProcessRefreshKind::nothing().with_memory(),
            );
            match system.process(self.pid) {
                Some(process) => process.memory(),
                None => {
                    log::warn!("process {} statistics unavailable", self.pid);
                    0
                }
            }
        }
    }

    impl MemoryMonitor for ProcessMemoryMonitor {
        fn footprint(&self) -> u64 {
            let mut sampler = match self.sampler.lock() {
                Ok(sampler) => sampler,
                Err(poisoned) => poisoned.into_inner(),
            };

            if sampler.remaining == 0 {
                let Sampler { system, cached, remaining } = &mut *sampler;
                *cached = self.sample(system);
                *remaining = self.sample_every;
            }
            sampler.remaining -= 1;

            return sampler.cached;
        }
    }

}
