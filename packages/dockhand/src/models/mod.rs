// ABOUTME: Value types and resource handles exposed by the docker client
// ABOUTME: Handles own their lifecycle state; values are validated at construction

pub mod container;
pub mod image;
pub mod options;
pub mod port_mapping;
pub mod stats;

pub use container::DockerContainer;
pub use image::DockerImage;
pub use options::StartContainerOptions;
pub use port_mapping::DockerPortMapping;
pub use stats::{ContainerStatsObservation, DockerContainerStat};
