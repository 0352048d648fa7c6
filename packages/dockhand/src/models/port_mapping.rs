// ABOUTME: Host-to-container port mapping validated against the network port range
// ABOUTME: Renders as the `external:internal` form docker run expects after `-p`

use crate::error::{DockhandError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DockerPortMapping {
    internal_port: u16,
    external_port: u16,
}

impl DockerPortMapping {
    pub fn new(internal_port: i32, external_port: i32) -> Result<Self> {
        Ok(Self {
            internal_port: checked_port("internal", internal_port)?,
            external_port: checked_port("external", external_port)?,
        })
    }

    /// Port inside the container
    pub fn internal_port(&self) -> u16 {
        self.internal_port
    }

    /// Port published on the host
    pub fn external_port(&self) -> u16 {
        self.external_port
    }
}

impl fmt::Display for DockerPortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.external_port, self.internal_port)
    }
}

fn checked_port(field: &'static str, value: i32) -> Result<u16> {
    match u16::try_from(value) {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(DockhandError::InvalidPort { field, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1)]
    #[case(1, 65535)]
    #[case(65535, 1)]
    #[case(65535, 65535)]
    #[case(8080, 80)]
    fn test_valid_ports(#[case] internal: i32, #[case] external: i32) {
        let mapping = DockerPortMapping::new(internal, external).unwrap();
        assert_eq!(mapping.internal_port() as i32, internal);
        assert_eq!(mapping.external_port() as i32, external);
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(65536)]
    #[case(i32::MIN)]
    #[case(i32::MAX)]
    fn test_invalid_internal_port(#[case] port: i32) {
        let error = DockerPortMapping::new(port, 80).unwrap_err();
        assert!(matches!(
            error,
            DockhandError::InvalidPort { field: "internal", value } if value == port
        ));
        assert!(error.is_validation());
    }

    #[rstest]
    #[case(0)]
    #[case(-80)]
    #[case(70000)]
    fn test_invalid_external_port(#[case] port: i32) {
        let error = DockerPortMapping::new(80, port).unwrap_err();
        assert!(matches!(
            error,
            DockhandError::InvalidPort { field: "external", .. }
        ));
    }

    #[test]
    fn test_renders_external_then_internal() {
        let mapping = DockerPortMapping::new(80, 8080).unwrap();
        assert_eq!(mapping.to_string(), "8080:80");
    }
}
