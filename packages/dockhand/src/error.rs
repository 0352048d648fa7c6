// ABOUTME: Error taxonomy for docker command execution and resource handle lifecycle
// ABOUTME: Separates local validation, command failures, parse errors and reconciled "gone" outcomes

use thiserror::Error;

/// Line separator used when rendering captured process output into messages
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

#[derive(Error, Debug)]
pub enum DockhandError {
    #[error("The working directory specified does not exist ('{0}')")]
    InvalidWorkingDirectory(String),

    #[error("The {field} network port specified ({value}) is not valid, the acceptable range is 1-65535")]
    InvalidPort { field: &'static str, value: i32 },

    #[error("If a memory limit is specified, the minimum limit that can be set is 4 mb (got {0} mb)")]
    InvalidMemoryLimit(u64),

    #[error("If a cpu limit is specified, it must be a positive decimal no greater than the number of cpu cores available ({available}), got {value}")]
    InvalidCpuLimit { value: f64, available: usize },

    #[error("The {stat} stat should never be negative, but encountered: {value}")]
    NegativeStat { stat: &'static str, value: f64 },

    #[error("Cannot build a stats observation from an empty set of readings")]
    EmptyObservation,

    #[error("{}", render_process_failure("The docker command did not exit with the expected result.", .command, .output))]
    CommandFailed { command: String, output: Vec<String> },

    #[error("{}", render_process_failure("The docker command exited successfully but did not exit with the expected result.", .command, .output))]
    UnexpectedOutput { command: String, output: Vec<String> },

    #[error("The docker image with id '{0}' has been deleted")]
    ImageDeleted(String),

    #[error("The docker container with id '{0}' has been deleted")]
    ContainerDeleted(String),

    #[error("The docker image with id '{id}' was not found when requesting image information")]
    ImageNotFound {
        id: String,
        source: Box<DockhandError>,
    },

    #[error("The docker container with id '{id}' was not found when requesting container information")]
    ContainerNotFound {
        id: String,
        source: Box<DockhandError>,
    },

    #[error("The docker image for '{repository}:{tag}' was not found")]
    ImageNotFoundByTag { repository: String, tag: String },

    #[error("Failed to parse docker output: {0}")]
    Parse(String),

    #[error("Command was cancelled before it exited: {command}")]
    Cancelled { command: String },

    #[error("Command timed out after {seconds}s: {command}")]
    TimedOut { command: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DockhandError>;

impl DockhandError {
    pub fn command_failed(command: impl Into<String>, output: Vec<String>) -> Self {
        DockhandError::CommandFailed {
            command: command.into(),
            output,
        }
    }

    /// True for a docker invocation that ran and reported failure
    pub fn is_command_failure(&self) -> bool {
        matches!(self, DockhandError::CommandFailed { .. })
    }

    /// True when the resource behind a handle is known to no longer exist
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            DockhandError::ImageDeleted(_)
                | DockhandError::ContainerDeleted(_)
                | DockhandError::ImageNotFound { .. }
                | DockhandError::ContainerNotFound { .. }
        )
    }

    /// True for errors raised locally before any process was spawned
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DockhandError::InvalidWorkingDirectory(_)
                | DockhandError::InvalidPort { .. }
                | DockhandError::InvalidMemoryLimit(_)
                | DockhandError::InvalidCpuLimit { .. }
                | DockhandError::NegativeStat { .. }
                | DockhandError::EmptyObservation
        )
    }
}

fn render_process_failure(header: &str, command: &str, output: &[String]) -> String {
    format!(
        "{header}{nl}Command: {command}{nl}Process Output:{nl}{output}",
        nl = LINE_ENDING,
        output = output.join(LINE_ENDING)
    )
}
