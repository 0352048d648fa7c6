// ABOUTME: Handle for a container started from an image: kill, remove and resource sampling
// ABOUTME: Failed commands are reconciled against the running container list to detect removal

use crate::client::DockerClient;
use crate::commands;
use crate::error::{DockhandError, Result};
use crate::lifecycle::{reconcile, LifecycleState, Transition, CONTAINER_GONE};
use crate::models::port_mapping::DockerPortMapping;
use crate::models::stats::{ContainerStatsObservation, DockerContainerStat};
use crate::parser::parse_stat_record;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct DockerContainer {
    client: DockerClient,
    id: String,
    port_mappings: Vec<DockerPortMapping>,
    state: LifecycleState,
}

impl DockerContainer {
    pub fn new(
        client: DockerClient,
        id: impl Into<String>,
        port_mappings: Vec<DockerPortMapping>,
    ) -> Self {
        Self {
            client,
            id: id.into(),
            port_mappings,
            state: LifecycleState::Active,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn port_mappings(&self) -> &[DockerPortMapping] {
        &self.port_mappings
    }

    pub fn is_deleted(&self) -> bool {
        self.state.is_deleted()
    }

    /// Kill the container; the handle is inert afterwards
    pub async fn kill(&mut self) -> Result<()> {
        let client = &self.client;
        let id = self.id.as_str();

        let outcome = reconcile(
            self.state,
            id,
            CONTAINER_GONE,
            move || async move {
                client.run(&commands::container::kill(id), None).await?;
                Ok(())
            },
            move || client.container_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        outcome.result?;
        info!("Killed container {}", self.id);
        self.state.apply(Transition::Deleted, &self.id);
        Ok(())
    }

    /// Remove the container; the handle is inert afterwards
    pub async fn remove(&mut self) -> Result<()> {
        let client = &self.client;
        let id = self.id.as_str();

        let outcome = reconcile(
            self.state,
            id,
            CONTAINER_GONE,
            move || async move {
                client.run(&commands::container::remove(id), None).await?;
                Ok(())
            },
            move || client.container_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        outcome.result?;
        info!("Removed container {}", self.id);
        self.state.apply(Transition::Deleted, &self.id);
        Ok(())
    }

    /// One cpu/memory reading
    pub async fn current_stat(&mut self) -> Result<DockerContainerStat> {
        let client = &self.client;
        let id = self.id.as_str();

        let outcome = reconcile(
            self.state,
            id,
            CONTAINER_GONE,
            move || read_stat(client, id, None),
            move || client.container_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        outcome.result
    }

    /// Sample readings back to back until `period` has elapsed or `cancel` fires.
    ///
    /// At least one reading is taken. Cancelling after the first reading ends
    /// the observation early; cancelling before it fails with `Cancelled`.
    pub async fn monitor_stats_for(
        &mut self,
        period: Duration,
        cancel: Option<CancellationToken>,
    ) -> Result<ContainerStatsObservation> {
        let client = &self.client;
        let id = self.id.as_str();
        let cancel = cancel.as_ref();

        let outcome = reconcile(
            self.state,
            id,
            CONTAINER_GONE,
            move || sample_until(client, id, period, cancel),
            move || client.container_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        outcome.result
    }
}

async fn read_stat(
    client: &DockerClient,
    id: &str,
    cancel: Option<CancellationToken>,
) -> Result<DockerContainerStat> {
    let command = commands::container::stats(id);
    let output = client.run(&command, cancel).await?;

    let Some(line) = output.stdout.lines().find(|line| !line.trim().is_empty()) else {
        return Err(DockhandError::UnexpectedOutput {
            command,
            output: output.lines,
        });
    };
    DockerContainerStat::try_from(parse_stat_record(line)?)
}

async fn sample_until(
    client: &DockerClient,
    id: &str,
    period: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<ContainerStatsObservation> {
    let deadline = Instant::now() + period;
    let max_samples = client.config().stats_max_samples.max(1);
    let mut stats = Vec::new();

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            if stats.is_empty() {
                return Err(DockhandError::Cancelled {
                    command: commands::container::stats(id),
                });
            }
            break;
        }

        match read_stat(client, id, cancel.cloned()).await {
            Ok(stat) => stats.push(stat),
            Err(DockhandError::Cancelled { .. }) if !stats.is_empty() => break,
            Err(e) => return Err(e),
        }

        if stats.len() >= max_samples || Instant::now() >= deadline {
            break;
        }
    }

    debug!("Collected {} stats samples for container {}", stats.len(), id);
    ContainerStatsObservation::new(stats)
}
