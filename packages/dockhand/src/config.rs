// ABOUTME: Runtime configuration for the docker command runner read from environment variables
// ABOUTME: Invalid or unparseable values fall back to defaults with a logged warning

use std::str::FromStr;
use std::time::Duration;

pub const DOCKHAND_COMMAND_TIMEOUT_SECS: &str = "DOCKHAND_COMMAND_TIMEOUT_SECS";
pub const DOCKHAND_STATS_MAX_SAMPLES: &str = "DOCKHAND_STATS_MAX_SAMPLES";

const DEFAULT_STATS_MAX_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DockhandConfig {
    /// Upper bound on a single docker invocation; `None` waits indefinitely
    pub command_timeout: Option<Duration>,
    /// Readings kept by a stats monitor before sampling stops early
    pub stats_max_samples: usize,
}

impl Default for DockhandConfig {
    fn default() -> Self {
        Self {
            command_timeout: None,
            stats_max_samples: DEFAULT_STATS_MAX_SAMPLES,
        }
    }
}

impl DockhandConfig {
    pub fn from_env() -> Self {
        let timeout_secs: u64 = parse_env_or_default(DOCKHAND_COMMAND_TIMEOUT_SECS, 0);
        let stats_max_samples = parse_env_or_default_with_validation(
            DOCKHAND_STATS_MAX_SAMPLES,
            DEFAULT_STATS_MAX_SAMPLES,
            |v| v > 0,
        );

        Self {
            command_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            stats_max_samples,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

/// Parse an environment variable with a fallback default value
pub fn parse_env_or_default<T>(var_name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    parse_env_or_default_with_validation(var_name, default, |_| true)
}

/// Parse an environment variable, keeping it only if it passes validation
pub fn parse_env_or_default_with_validation<T, F>(var_name: &str, default: T, validator: F) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(T) -> bool,
{
    let Ok(raw_value) = std::env::var(var_name) else {
        return default;
    };

    match raw_value.trim().parse::<T>() {
        Ok(parsed) if validator(parsed) => parsed,
        Ok(_) => {
            tracing::warn!(
                "Environment variable {} has invalid value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
        Err(_) => {
            tracing::warn!(
                "Environment variable {} has unparseable value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
    }
}
