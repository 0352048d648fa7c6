// ABOUTME: CLI commands for containers: kill, remove, resource stats and pruning
// ABOUTME: Monitoring can be stopped early with Ctrl+C and still reports what it sampled

use super::output::{observation_table, stat_table};
use anyhow::Result;
use clap::Subcommand;
use colored::*;
use dockhand::{CancellationToken, DockerClient};
use std::time::Duration;

#[derive(Subcommand)]
pub enum ContainerCommands {
    /// Kill a running container
    Kill {
        /// Container id
        container: String,
    },
    /// Remove a container
    Rm {
        /// Container id
        container: String,
        /// Kill the container first
        #[arg(short, long)]
        force: bool,
    },
    /// Show a single cpu/memory reading
    Stats {
        /// Container id
        container: String,
    },
    /// Sample cpu/memory for a period and report average and peak usage
    Monitor {
        /// Container id
        container: String,
        /// Sampling period in seconds
        #[arg(long, default_value = "10")]
        seconds: u64,
    },
    /// Remove all stopped containers
    Prune,
}

pub async fn handle_container_command(
    client: &DockerClient,
    command: ContainerCommands,
) -> Result<()> {
    match command {
        ContainerCommands::Kill { container } => {
            client.container(&container, Vec::new()).kill().await?;
            println!("{} Killed container {}", "✓".green(), container.cyan());
            Ok(())
        }
        ContainerCommands::Rm { container, force } => {
            remove_container(client, &container, force).await
        }
        ContainerCommands::Stats { container } => {
            let stat = client.container(&container, Vec::new()).current_stat().await?;
            println!("{}", stat_table(&stat));
            Ok(())
        }
        ContainerCommands::Monitor { container, seconds } => {
            monitor_container(client, &container, Duration::from_secs(seconds)).await
        }
        ContainerCommands::Prune => {
            for line in client.prune_containers().await? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn remove_container(client: &DockerClient, container_id: &str, force: bool) -> Result<()> {
    if force {
        client.force_remove_container(container_id).await?;
    } else {
        client.container(container_id, Vec::new()).remove().await?;
    }

    println!("{} Removed container {}", "✓".green(), container_id.cyan());
    Ok(())
}

async fn monitor_container(client: &DockerClient, container_id: &str, period: Duration) -> Result<()> {
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!(
        "📈 Monitoring {} for {}s (Ctrl+C to stop early)",
        container_id,
        period.as_secs()
    );

    let result = client
        .container(container_id, Vec::new())
        .monitor_stats_for(period, Some(token.clone()))
        .await;
    watcher.abort();

    let observation = result?;
    if token.is_cancelled() {
        println!("{}", "Stopped early".yellow());
    }
    println!("{}", observation_table(&observation));
    println!("Samples: {}", observation.len().to_string().cyan());
    Ok(())
}
