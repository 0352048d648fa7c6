// ABOUTME: Programmatic client for the docker CLI with typed image and container handles
// ABOUTME: Handles reconcile failed commands against docker's listings to detect vanished resources

pub mod client;
pub mod commands;
pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod parser;
pub mod shell;

pub use client::DockerClient;
pub use config::DockhandConfig;
pub use environment::{DockhandEnvironment, StaticEnvironment, SystemEnvironment};
pub use error::{DockhandError, Result, LINE_ENDING};
pub use lifecycle::{LifecycleState, Reconciled, Transition};
pub use models::{
    ContainerStatsObservation, DockerContainer, DockerContainerStat, DockerImage,
    DockerPortMapping, StartContainerOptions,
};
pub use parser::{ContainerStatRecord, ImageRecord};
pub use shell::{CommandOutput, RunCommands, ShellCommandRunner, ShellInvocation};

// Token accepted by runners and stats monitoring
pub use tokio_util::sync::CancellationToken;
