use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::containers::ContainerCommands;
use cli::images::ImageCommands;

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(about = "Dockhand - typed front end for the docker CLI")]
#[command(version)]
struct Cli {
    /// Working directory docker commands run from
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Images(ImageCommands),
    #[command(flatten)]
    Containers(ContainerCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.dir, cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(dir: PathBuf, command: Commands) -> anyhow::Result<()> {
    let client = dockhand::DockerClient::for_directory(&dir)?;

    match command {
        Commands::Images(command) => cli::images::handle_image_command(&client, command).await,
        Commands::Containers(command) => {
            cli::containers::handle_container_command(&client, command).await
        }
    }
}
