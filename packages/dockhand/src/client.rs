// ABOUTME: Docker client bound to a working directory, issuing image and container commands
// ABOUTME: Entry point for listing, building and probing resources and for creating handles

use crate::commands;
use crate::config::DockhandConfig;
use crate::environment::{DockhandEnvironment, SystemEnvironment};
use crate::error::{DockhandError, Result};
use crate::models::container::DockerContainer;
use crate::models::image::DockerImage;
use crate::models::port_mapping::DockerPortMapping;
use crate::parser::{parse_image_record, ImageRecord};
use crate::shell::{CommandOutput, RunCommands, ShellCommandRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cheap to clone; handles keep their own clone to issue commands
#[derive(Clone)]
pub struct DockerClient {
    runner: Arc<dyn RunCommands>,
    environment: Arc<dyn DockhandEnvironment>,
    working_directory: PathBuf,
    config: DockhandConfig,
}

impl fmt::Debug for DockerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerClient")
            .field("working_directory", &self.working_directory)
            .field("environment", &self.environment)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DockerClient {
    /// Client that runs the real docker CLI from `working_directory`
    pub fn for_directory(working_directory: impl AsRef<Path>) -> Result<Self> {
        let config = DockhandConfig::from_env();
        let environment: Arc<dyn DockhandEnvironment> = Arc::new(SystemEnvironment);
        let runner = ShellCommandRunner::new(environment.clone())
            .with_timeout(config.command_timeout);

        Ok(Self::with_runner(working_directory, Arc::new(runner), environment)?.with_config(config))
    }

    /// Client that issues commands through a caller-provided runner
    pub fn with_runner(
        working_directory: impl AsRef<Path>,
        runner: Arc<dyn RunCommands>,
        environment: Arc<dyn DockhandEnvironment>,
    ) -> Result<Self> {
        let working_directory = working_directory.as_ref();
        if !working_directory.is_dir() {
            return Err(DockhandError::InvalidWorkingDirectory(
                working_directory.display().to_string(),
            ));
        }

        Ok(Self {
            runner,
            environment,
            working_directory: working_directory.to_path_buf(),
            config: DockhandConfig::default(),
        })
    }

    pub fn with_config(mut self, config: DockhandConfig) -> Self {
        self.config = config;
        self
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn environment(&self) -> &dyn DockhandEnvironment {
        self.environment.as_ref()
    }

    pub fn config(&self) -> &DockhandConfig {
        &self.config
    }

    /// Run a command, turning an unsuccessful exit into `CommandFailed`
    pub(crate) async fn run(
        &self,
        command: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<CommandOutput> {
        debug!("Running docker command: {}", command);
        let output = self
            .runner
            .run_command(command, &self.working_directory, cancel)
            .await?;
        debug!(
            "Docker command exited (success: {}, code: {:?}): {}",
            output.success, output.exit_code, command
        );
        output.ensure_success(command)
    }

    /// Every local image, in the order docker lists them
    pub async fn get_images(&self) -> Result<Vec<DockerImage>> {
        let command = commands::image::list();
        let output = self.run(&command, None).await?;

        output
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_image_record(line).map(|record| self.image(record)))
            .collect()
    }

    /// The first image listed under `repository:tag`
    pub async fn get_image(&self, repository: &str, tag: &str) -> Result<DockerImage> {
        self.get_images()
            .await?
            .into_iter()
            .find(|image| image.repository() == repository && image.tag() == tag)
            .ok_or_else(|| DockhandError::ImageNotFoundByTag {
                repository: repository.to_string(),
                tag: tag.to_string(),
            })
    }

    /// Build `dockerfile` from the working directory and return the tagged image
    pub async fn build_image(
        &self,
        dockerfile: &str,
        target: Option<&str>,
        repository: &str,
        tag: &str,
    ) -> Result<DockerImage> {
        let command = commands::image::build(dockerfile, target, repository, tag);
        self.run(&command, None).await?;
        self.get_image(repository, tag).await
    }

    pub async fn image_exists(&self, image_id: &str) -> Result<bool> {
        self.id_is_listed(commands::image::LIST_IDS, image_id).await
    }

    pub async fn container_exists(&self, container_id: &str) -> Result<bool> {
        self.id_is_listed(commands::container::LIST_IDS, container_id)
            .await
    }

    /// Remove all stopped containers
    pub async fn prune_containers(&self) -> Result<Vec<String>> {
        let output = self.run(commands::container::PRUNE, None).await?;
        Ok(output.lines)
    }

    /// Kill the container if it is running, then remove it.
    ///
    /// A stopped container refuses the kill and is missing from `docker ps`,
    /// which marks the killing handle deleted; removal runs on its own handle.
    pub async fn force_remove_container(&self, container_id: &str) -> Result<()> {
        let mut running = self.container(container_id, Vec::new());
        match running.kill().await {
            Ok(()) => {}
            Err(e) if e.is_command_failure() || e.is_gone() => {
                debug!("Container {} was not running: {}", container_id, e);
            }
            Err(e) => return Err(e),
        }

        self.container(container_id, Vec::new()).remove().await
    }

    /// Handle for an image identified elsewhere, e.g. by an earlier listing
    pub fn image(&self, record: ImageRecord) -> DockerImage {
        DockerImage::new(self.clone(), record)
    }

    /// Handle for a container started elsewhere
    pub fn container(
        &self,
        container_id: impl Into<String>,
        port_mappings: Vec<DockerPortMapping>,
    ) -> DockerContainer {
        DockerContainer::new(self.clone(), container_id, port_mappings)
    }

    async fn id_is_listed(&self, command: &str, id: &str) -> Result<bool> {
        let output = self.run(command, None).await?;
        Ok(output.stdout.lines().any(|line| line.trim() == id))
    }
}
