// ABOUTME: Options for starting a container from an image: published ports and resource limits
// ABOUTME: Limits are checked against the host environment before any command is rendered

use crate::environment::DockhandEnvironment;
use crate::error::{DockhandError, Result};
use crate::models::port_mapping::DockerPortMapping;
use serde::Serialize;

/// Smallest memory limit docker accepts, in megabytes
pub const MIN_MEMORY_LIMIT_MB: u64 = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartContainerOptions {
    port_mappings: Vec<DockerPortMapping>,
    memory_limit_mb: Option<u64>,
    cpu_limit: Option<f64>,
}

impl StartContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the container's memory, in megabytes
    pub fn with_memory_limit(mut self, megabytes: u64) -> Self {
        self.memory_limit_mb = Some(megabytes);
        self
    }

    /// Limit the number of cpu cores the container may use
    pub fn with_cpu_limit(mut self, cpus: f64) -> Self {
        self.cpu_limit = Some(cpus);
        self
    }

    /// Publish a container port on the host
    pub fn expose_port(mut self, internal_port: i32, external_port: i32) -> Result<Self> {
        self.port_mappings
            .push(DockerPortMapping::new(internal_port, external_port)?);
        Ok(self)
    }

    pub fn expose_ports(mut self, mappings: impl IntoIterator<Item = DockerPortMapping>) -> Self {
        self.port_mappings.extend(mappings);
        self
    }

    pub fn port_mappings(&self) -> &[DockerPortMapping] {
        &self.port_mappings
    }

    pub fn memory_limit_mb(&self) -> Option<u64> {
        self.memory_limit_mb
    }

    pub fn cpu_limit(&self) -> Option<f64> {
        self.cpu_limit
    }

    /// Check limits against docker's minimums and the host's core count
    pub fn validate(&self, environment: &dyn DockhandEnvironment) -> Result<()> {
        if let Some(megabytes) = self.memory_limit_mb {
            if megabytes < MIN_MEMORY_LIMIT_MB {
                return Err(DockhandError::InvalidMemoryLimit(megabytes));
            }
        }

        if let Some(cpus) = self.cpu_limit {
            let available = environment.logical_cpu_count();
            if !(cpus > 0.0 && cpus <= available as f64) {
                return Err(DockhandError::InvalidCpuLimit {
                    value: cpus,
                    available,
                });
            }
        }

        Ok(())
    }
}
