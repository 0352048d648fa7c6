// ABOUTME: Host environment capability used for shell dispatch and resource limit checks
// ABOUTME: Keeps OS detection and core counting injectable so both can be faked in tests

use std::fmt::Debug;

/// Facts about the host the docker CLI runs on
pub trait DockhandEnvironment: Send + Sync + Debug {
    /// Whether commands must be dispatched through `cmd.exe`
    fn is_windows(&self) -> bool;

    /// Number of logical cores, the upper bound for a container cpu limit
    fn logical_cpu_count(&self) -> usize;
}

/// The real host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl DockhandEnvironment for SystemEnvironment {
    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn logical_cpu_count(&self) -> usize {
        num_cpus::get()
    }
}

/// A fixed environment, for tests and for callers targeting a remote engine
#[derive(Debug, Clone, Copy)]
pub struct StaticEnvironment {
    pub windows: bool,
    pub cpu_count: usize,
}

impl StaticEnvironment {
    pub fn linux(cpu_count: usize) -> Self {
        Self {
            windows: false,
            cpu_count,
        }
    }

    pub fn windows(cpu_count: usize) -> Self {
        Self {
            windows: true,
            cpu_count,
        }
    }
}

impl DockhandEnvironment for StaticEnvironment {
    fn is_windows(&self) -> bool {
        self.windows
    }

    fn logical_cpu_count(&self) -> usize {
        self.cpu_count
    }
}
