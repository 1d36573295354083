//! Configuration loading and validation
//!
//! The routing document is a static YAML file; [`ProxyConfig::from_file`]
//! reads and parses it and runs the shallow [`Validate`] pass. Structural
//! validation (host conflicts, cluster references, regexes, ring sizes)
//! happens when the document is turned into a snapshot by the router
//! builder, so that a reload either publishes a whole consistent snapshot
//! or leaves the previous one standing.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use std::path::Path;

use tracing::{debug, info};

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or building configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the document or cache file failed
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON cache decoding failed
    #[error("failed to decode cache: {0}")]
    Json(#[from] serde_json::Error),

    /// Shallow document validation failed
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A host is claimed by more than one service
    #[error("host {host} is claimed by both service {first} and service {second}")]
    ConflictingHost {
        host: String,
        first: String,
        second: String,
    },

    /// A route destination names a cluster the service does not define
    #[error("destination references unknown cluster {cluster} in service {service}")]
    UnknownCluster { service: String, cluster: String },

    /// A cluster has no endpoints and is not pass-through
    #[error("cluster {cluster} in service {service} has no endpoints")]
    EmptyCluster { service: String, cluster: String },

    /// A match predicate carries a regex that does not compile
    #[error("invalid regex {pattern:?} in service {service}: {source}")]
    InvalidRegex {
        service: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A match clause constrains the port to a negative value
    #[error("negative match port {port} in service {service}")]
    NegativePort { service: String, port: i32 },

    /// Consistent hashing selected with a ring smaller than one node
    #[error("consistent-hash minimum ring size must be >= 1 in service {service} ({scope})")]
    InvalidRingSize { service: String, scope: String },

    /// Both the simple and the consistent-hash balancer are configured
    #[error("both simple and consistentHash load balancers set in service {service} ({scope})")]
    AmbiguousLoadBalancer { service: String, scope: String },

    /// A top-level rule targets a service the document does not define
    #[error("rule {rule} targets unknown service {service}")]
    UnknownRuleService { rule: String, service: String },
}

impl ProxyConfig {
    /// Load and validate a routing document from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading routing configuration");

        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a routing document from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ProxyConfig = serde_yaml::from_str(content)?;
        config.validate()?;

        debug!(
            services = config.services.len(),
            top_level_rules = config.rules.len(),
            "routing configuration parsed"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
services:
  - name: catalog
    hosts: [catalog.local]
    clusters:
      - name: v1
        endpoints: [{ip: 10.0.0.1, port: "8080"}]
        trafficPolicy: { loadBalancer: { simple: ROUND_ROBIN } }
    rules:
      - name: default
        http:
          - match: [{ uri: { prefix: "/api/" } }]
            route: [{ destination: { cluster: v1 }, weight: 1 }]
"#;

    #[test]
    fn test_minimal_document_parses() {
        let config = ProxyConfig::from_yaml(MINIMAL).expect("parse");
        assert_eq!(config.services.len(), 1);

        let service = &config.services[0];
        assert_eq!(service.name, "catalog");
        assert_eq!(service.hosts, vec!["catalog.local"]);
        assert_eq!(service.clusters[0].name, "v1");
        assert_eq!(
            service.clusters[0].traffic_policy.load_balancer.simple,
            Some(SimpleLb::RoundRobin)
        );
        assert_eq!(service.rules[0].http[0].matches[0].uri.prefix, "/api/");
    }

    #[tokio::test]
    async fn test_from_file_missing_path() {
        let err = ProxyConfig::from_file("/nonexistent/routing.yaml")
            .await
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let err = ProxyConfig::from_yaml("services: {not: [a, list").expect_err("bad yaml");
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
