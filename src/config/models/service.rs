//! Service, cluster and endpoint document types

use serde::{Deserialize, Serialize};

use super::policy::TrafficPolicy;
use super::route::RouteRule;

/// A concrete `ip:port` backend destination
///
/// Immutable once constructed; its identity key is [`Endpoint::key`].
/// The port is kept as a string because it is forwarded verbatim when the
/// caller dials the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Endpoint {
    /// Backend IP address
    #[serde(default)]
    pub ip: String,
    /// Backend port
    #[serde(default)]
    pub port: String,
}

impl Endpoint {
    /// Create an endpoint from its address parts
    pub fn new(ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
        }
    }

    /// Identity key in `ip:port` form
    pub fn key(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A named set of endpoints sharing one load-balancing policy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster name, unique within its service
    pub name: String,
    /// Ordered backend endpoints
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Load-balancing policy for this cluster's endpoints
    #[serde(default)]
    pub traffic_policy: TrafficPolicy,
}

/// A named group of clusters reachable via one or more hostnames
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service name, the key under which rules and indexes are registered
    pub name: String,
    /// Hostnames that resolve to this service; a host may appear in at most
    /// one service across the whole document
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Clusters owned by this service
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    /// Service-level policy; supplies the load balancer used when the
    /// service has no routing rules (default: round robin)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
    /// Routing rules evaluated in order, first match wins
    #[serde(default)]
    pub rules: Vec<RouteRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_key() {
        let endpoint = Endpoint::new("10.0.0.1", "8080");
        assert_eq!(endpoint.key(), "10.0.0.1:8080");
        assert_eq!(endpoint.to_string(), "10.0.0.1:8080");
    }

    #[test]
    fn test_cluster_yaml_shape() {
        let yaml = r#"
name: v1
endpoints:
  - { ip: 10.0.0.1, port: "8080" }
trafficPolicy:
  loadBalancer:
    simple: ROUND_ROBIN
"#;
        let cluster: Cluster = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(cluster.name, "v1");
        assert_eq!(cluster.endpoints.len(), 1);
        assert_eq!(cluster.endpoints[0].key(), "10.0.0.1:8080");
    }
}
