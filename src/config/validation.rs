//! Shallow configuration validation
//!
//! Field-level checks that do not need the whole document in view.
//! Cross-cutting checks (host conflicts, cluster references, regex
//! compilation) live in the snapshot builder.

use tracing::debug;

use super::models::*;
use super::{ConfigError, Result};

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for ProxyConfig {
    fn validate(&self) -> Result<()> {
        debug!("validating routing document");

        for service in &self.services {
            service.validate()?;
        }
        for rule in &self.rules {
            if rule.service_name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "top-level rule {:?} must name a service",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

impl Validate for Service {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid(
                "service name cannot be empty".to_string(),
            ));
        }
        for host in &self.hosts {
            if host.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "service {} lists an empty host",
                    self.name
                )));
            }
        }
        for cluster in &self.clusters {
            cluster.validate().map_err(|e| {
                ConfigError::Invalid(format!("service {}: {}", self.name, e))
            })?;
        }
        Ok(())
    }
}

impl Validate for Cluster {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid(
                "cluster name cannot be empty".to_string(),
            ));
        }
        for endpoint in &self.endpoints {
            if endpoint.ip.is_empty() || endpoint.port.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "cluster {} has an endpoint with a missing ip or port",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_service_name_rejected() {
        let config = ProxyConfig {
            services: vec![Service::default()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_incomplete_endpoint_rejected() {
        let cluster = Cluster {
            name: "v1".to_string(),
            endpoints: vec![Endpoint::new("10.0.0.1", "")],
            ..Default::default()
        };
        assert!(cluster.validate().is_err());
    }

    #[test]
    fn test_top_level_rule_needs_service_name() {
        let config = ProxyConfig {
            rules: vec![RouteRule {
                name: "orphan".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
