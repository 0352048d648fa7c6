// ABOUTME: Renders the docker command lines issued by the client and resource handles
// ABOUTME: Output templates emit one JSON object per line so the parser never scrapes tables

use crate::models::options::StartContainerOptions;

/// Image listing template; single-quoted so the shell leaves the braces alone
const IMAGE_FORMAT: &str = r#"'{"repository":"{{.Repository}}","tag":"{{.Tag}}","id":"{{.ID}}"}'"#;

const STATS_FORMAT: &str = r#"'{"cpu":"{{.CPUPerc}}","mem":"{{.MemPerc}}"}'"#;

pub mod image {
    use super::*;

    /// Ids of every local image, one per line
    pub const LIST_IDS: &str = "docker image ls -q";

    pub fn build(dockerfile: &str, target: Option<&str>, repository: &str, tag: &str) -> String {
        let mut command = format!("docker build . -f {} -t {}:{}", dockerfile, repository, tag);
        if let Some(target) = target.filter(|t| !t.trim().is_empty()) {
            command.push_str(&format!(" --target {}", target));
        }
        command
    }

    pub fn list() -> String {
        format!("docker images --format {}", IMAGE_FORMAT)
    }

    /// Detached run; callers validate `options` first
    pub fn run_container(image_id: &str, options: &StartContainerOptions) -> String {
        let mut command = String::from("docker run -d");

        for mapping in options.port_mappings() {
            command.push_str(&format!(" -p {}", mapping));
        }
        if let Some(megabytes) = options.memory_limit_mb() {
            command.push_str(&format!(" --memory {}m", megabytes));
        }
        if let Some(cpus) = options.cpu_limit() {
            command.push_str(&format!(" --cpus \"{}\"", cpus));
        }

        command.push(' ');
        command.push_str(image_id);
        command
    }

    pub fn remove(image_id: &str) -> String {
        format!("docker rmi {}", image_id)
    }
}

pub mod container {
    use super::*;

    /// Ids of running containers, one per line
    pub const LIST_IDS: &str = "docker ps -q";

    pub const PRUNE: &str = "docker container prune -f";

    pub fn stats(container_id: &str) -> String {
        format!(
            "docker stats --no-stream --format {} {}",
            STATS_FORMAT, container_id
        )
    }

    pub fn kill(container_id: &str) -> String {
        format!("docker container kill {}", container_id)
    }

    pub fn remove(container_id: &str) -> String {
        format!("docker container rm {}", container_id)
    }
}
