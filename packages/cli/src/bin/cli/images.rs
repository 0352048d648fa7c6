// ABOUTME: CLI commands for docker images: list, build, run and remove
// ABOUTME: Images are addressed as repository[:tag] and resolved through the image listing

use super::output::{new_table, truncate};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use dockhand::{DockerClient, DockerPortMapping, StartContainerOptions};

const DEFAULT_TAG: &str = "latest";

#[derive(Subcommand)]
pub enum ImageCommands {
    /// List local images
    Images {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Build an image from the working directory
    Build {
        /// Image reference to tag the build with (repository[:tag])
        image: String,
        /// Path to the Dockerfile, relative to the working directory
        #[arg(short = 'f', long, default_value = "Dockerfile")]
        dockerfile: String,
        /// Build stage to stop at
        #[arg(long)]
        target: Option<String>,
    },
    /// Start a detached container from an image
    Run {
        /// Image reference (repository[:tag])
        image: String,
        /// Publish a port as EXTERNAL:INTERNAL
        #[arg(short = 'p', long = "publish", value_parser = parse_port_mapping)]
        publish: Vec<DockerPortMapping>,
        /// Memory limit in megabytes
        #[arg(long)]
        memory: Option<u64>,
        /// Number of cpu cores the container may use
        #[arg(long)]
        cpus: Option<f64>,
    },
    /// Remove an image
    Rmi {
        /// Image reference (repository[:tag])
        image: String,
    },
}

pub async fn handle_image_command(client: &DockerClient, command: ImageCommands) -> Result<()> {
    match command {
        ImageCommands::Images { json } => list_images(client, json).await,
        ImageCommands::Build {
            image,
            dockerfile,
            target,
        } => build_image(client, &image, &dockerfile, target.as_deref()).await,
        ImageCommands::Run {
            image,
            publish,
            memory,
            cpus,
        } => run_container(client, &image, publish, memory, cpus).await,
        ImageCommands::Rmi { image } => remove_image(client, &image).await,
    }
}

async fn list_images(client: &DockerClient, json: bool) -> Result<()> {
    let images = client.get_images().await?;

    if json {
        let records: Vec<_> = images.iter().map(|image| image.record()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if images.is_empty() {
        println!("{}", "No images found".yellow());
        return Ok(());
    }

    let mut table = new_table(vec!["Repository", "Tag", "Image ID"]);
    for image in &images {
        table.add_row(vec![
            truncate(image.repository(), 40),
            truncate(image.tag(), 20),
            image.id().to_string(),
        ]);
    }

    println!("{}", table);
    println!("Total: {} images", images.len().to_string().cyan());
    Ok(())
}

async fn build_image(
    client: &DockerClient,
    reference: &str,
    dockerfile: &str,
    target: Option<&str>,
) -> Result<()> {
    let (repository, tag) = parse_image_reference(reference);
    println!("🔨 Building {}:{} from {}", repository, tag, dockerfile);

    let image = client
        .build_image(dockerfile, target, &repository, &tag)
        .await
        .with_context(|| format!("Failed to build {}:{}", repository, tag))?;

    println!("{} Built image {}", "✓".green(), image.id().cyan());
    Ok(())
}

async fn run_container(
    client: &DockerClient,
    reference: &str,
    publish: Vec<DockerPortMapping>,
    memory: Option<u64>,
    cpus: Option<f64>,
) -> Result<()> {
    let (repository, tag) = parse_image_reference(reference);
    let mut image = client.get_image(&repository, &tag).await?;

    let mut options = StartContainerOptions::new().expose_ports(publish);
    if let Some(megabytes) = memory {
        options = options.with_memory_limit(megabytes);
    }
    if let Some(cores) = cpus {
        options = options.with_cpu_limit(cores);
    }

    let container = image.start_container(options).await?;

    println!("{} Started container {}", "✓".green(), container.id().cyan());
    for mapping in container.port_mappings() {
        println!("  {} -> {}", mapping.external_port(), mapping.internal_port());
    }
    Ok(())
}

async fn remove_image(client: &DockerClient, reference: &str) -> Result<()> {
    let (repository, tag) = parse_image_reference(reference);
    let mut image = client.get_image(&repository, &tag).await?;
    image.remove().await?;

    println!("{} Removed image {}:{}", "✓".green(), repository, tag);
    Ok(())
}

/// Split `repository[:tag]`, ignoring a registry port such as `localhost:5000/web`
fn parse_image_reference(reference: &str) -> (String, String) {
    match reference.rsplit_once(':') {
        Some((repository, tag)) if !tag.contains('/') && !repository.is_empty() => {
            (repository.to_string(), tag.to_string())
        }
        _ => (reference.to_string(), DEFAULT_TAG.to_string()),
    }
}

/// Parse `EXTERNAL:INTERNAL` into a validated mapping
fn parse_port_mapping(value: &str) -> std::result::Result<DockerPortMapping, String> {
    let (external, internal) = value
        .split_once(':')
        .ok_or_else(|| format!("expected EXTERNAL:INTERNAL, got '{}'", value))?;
    let external: i32 = external
        .trim()
        .parse()
        .map_err(|_| format!("invalid external port '{}'", external))?;
    let internal: i32 = internal
        .trim()
        .parse()
        .map_err(|_| format!("invalid internal port '{}'", internal))?;

    DockerPortMapping::new(internal, external).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("web", "web", "latest")]
    #[case("web:1.2", "web", "1.2")]
    #[case("team/web:dev", "team/web", "dev")]
    #[case("localhost:5000/web", "localhost:5000/web", "latest")]
    #[case("localhost:5000/web:v2", "localhost:5000/web", "v2")]
    fn test_parse_image_reference(
        #[case] reference: &str,
        #[case] repository: &str,
        #[case] tag: &str,
    ) {
        assert_eq!(
            parse_image_reference(reference),
            (repository.to_string(), tag.to_string())
        );
    }

    #[test]
    fn test_parse_port_mapping() {
        let mapping = parse_port_mapping("8080:80").unwrap();
        assert_eq!(mapping.external_port(), 8080);
        assert_eq!(mapping.internal_port(), 80);
    }

    #[rstest]
    #[case("8080")]
    #[case("x:80")]
    #[case("8080:0")]
    #[case("70000:80")]
    fn test_parse_port_mapping_rejects(#[case] value: &str) {
        assert!(parse_port_mapping(value).is_err());
    }
}
