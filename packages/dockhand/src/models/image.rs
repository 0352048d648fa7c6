// ABOUTME: Handle for a local docker image: start containers from it or remove it
// ABOUTME: Failed commands are reconciled against the image listing to detect removal

use crate::client::DockerClient;
use crate::commands;
use crate::error::{DockhandError, Result};
use crate::lifecycle::{reconcile, LifecycleState, Transition, IMAGE_GONE};
use crate::models::container::DockerContainer;
use crate::models::options::StartContainerOptions;
use crate::parser::ImageRecord;
use crate::shell::CommandOutput;
use tracing::info;

/// Length of the short id docker prints for containers
const SHORT_ID_LEN: usize = 12;

#[derive(Debug)]
pub struct DockerImage {
    client: DockerClient,
    repository: String,
    tag: String,
    id: String,
    state: LifecycleState,
}

impl DockerImage {
    pub fn new(client: DockerClient, record: ImageRecord) -> Self {
        Self {
            client,
            repository: record.repository,
            tag: record.tag,
            id: record.id,
            state: LifecycleState::Active,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_deleted(&self) -> bool {
        self.state.is_deleted()
    }

    pub fn record(&self) -> ImageRecord {
        ImageRecord {
            repository: self.repository.clone(),
            tag: self.tag.clone(),
            id: self.id.clone(),
        }
    }

    /// Start a detached container from this image
    pub async fn start_container(
        &mut self,
        options: StartContainerOptions,
    ) -> Result<DockerContainer> {
        let client = &self.client;
        let id = self.id.as_str();
        let options_ref = &options;

        let outcome = reconcile(
            self.state,
            id,
            IMAGE_GONE,
            move || async move {
                options_ref.validate(client.environment())?;
                let command = commands::image::run_container(id, options_ref);
                let output = client.run(&command, None).await?;
                container_id_from_output(&command, output)
            },
            move || client.image_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        let container_id = outcome.result?;
        info!("Started container {} from image {}", container_id, self.id);

        Ok(DockerContainer::new(
            self.client.clone(),
            container_id,
            options.port_mappings().to_vec(),
        ))
    }

    /// Remove the image; the handle is inert afterwards
    pub async fn remove(&mut self) -> Result<()> {
        let client = &self.client;
        let id = self.id.as_str();

        let outcome = reconcile(
            self.state,
            id,
            IMAGE_GONE,
            move || async move {
                client.run(&commands::image::remove(id), None).await?;
                Ok(())
            },
            move || client.image_exists(id),
        )
        .await;

        self.state.apply(outcome.transition, &self.id);
        outcome.result?;
        info!("Removed image {}", self.id);
        self.state.apply(Transition::Deleted, &self.id);
        Ok(())
    }
}

fn container_id_from_output(command: &str, output: CommandOutput) -> Result<String> {
    let short_id: Option<String> = output
        .first_stdout_line()
        .map(str::trim)
        .filter(|line| line.chars().count() >= SHORT_ID_LEN)
        .map(|line| line.chars().take(SHORT_ID_LEN).collect());

    short_id.ok_or_else(|| DockhandError::UnexpectedOutput {
        command: command.to_string(),
        output: output.lines,
    })
}
