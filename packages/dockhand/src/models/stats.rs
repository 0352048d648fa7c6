// ABOUTME: Container resource readings and the aggregated observation built from a monitoring run
// ABOUTME: Readings are validated non-negative; observations are never empty

use crate::error::{DockhandError, Result};
use crate::parser::{parse_stat_record, ContainerStatRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One cpu/memory reading, both as percentages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerContainerStat {
    cpu: f64,
    memory: f64,
    observed_at: DateTime<Utc>,
}

impl DockerContainerStat {
    pub fn new(cpu: f64, memory: f64) -> Result<Self> {
        Ok(Self {
            cpu: checked_stat("cpu", cpu)?,
            memory: checked_stat("memory", memory)?,
            observed_at: Utc::now(),
        })
    }

    pub fn cpu(&self) -> f64 {
        self.cpu
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

impl TryFrom<ContainerStatRecord> for DockerContainerStat {
    type Error = DockhandError;

    fn try_from(record: ContainerStatRecord) -> Result<Self> {
        Self::new(record.cpu, record.memory)
    }
}

fn checked_stat(stat: &'static str, value: f64) -> Result<f64> {
    if value.is_nan() || value < 0.0 {
        return Err(DockhandError::NegativeStat { stat, value });
    }
    Ok(value)
}

/// Readings collected over a monitoring period
#[derive(Debug, Clone, Serialize)]
pub struct ContainerStatsObservation {
    stats: Vec<DockerContainerStat>,
}

impl ContainerStatsObservation {
    pub fn new(stats: Vec<DockerContainerStat>) -> Result<Self> {
        if stats.is_empty() {
            return Err(DockhandError::EmptyObservation);
        }
        Ok(Self { stats })
    }

    /// Build from raw `docker stats` JSON lines
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let stats = lines
            .iter()
            .map(|line| parse_stat_record(line.as_ref()).and_then(DockerContainerStat::try_from))
            .collect::<Result<Vec<_>>>()?;
        Self::new(stats)
    }

    /// Build from raw `(cpu, memory)` pairs, validating each
    pub fn from_readings(readings: &[(f64, f64)]) -> Result<Self> {
        let stats = readings
            .iter()
            .map(|&(cpu, memory)| DockerContainerStat::new(cpu, memory))
            .collect::<Result<Vec<_>>>()?;
        Self::new(stats)
    }

    pub fn stats(&self) -> &[DockerContainerStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn average_cpu(&self) -> f64 {
        self.average(DockerContainerStat::cpu)
    }

    pub fn average_memory(&self) -> f64 {
        self.average(DockerContainerStat::memory)
    }

    pub fn max_cpu(&self) -> f64 {
        self.max(DockerContainerStat::cpu)
    }

    pub fn max_memory(&self) -> f64 {
        self.max(DockerContainerStat::memory)
    }

    fn average(&self, metric: fn(&DockerContainerStat) -> f64) -> f64 {
        self.stats.iter().map(metric).sum::<f64>() / self.stats.len() as f64
    }

    fn max(&self, metric: fn(&DockerContainerStat) -> f64) -> f64 {
        self.stats.iter().map(metric).fold(0.0, f64::max)
    }
}
