//! Traffic policy and load-balancer settings

use serde::{Deserialize, Serialize};

/// Simple load-balancer policy names
///
/// The names follow the conventional service-mesh spelling
/// (`ROUND_ROBIN`, `LEAST_CONN`, ...) as they appear in the YAML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleLb {
    /// Cycle through endpoints in order
    #[default]
    RoundRobin,
    /// Endpoint with the fewest active connections
    LeastConn,
    /// Uniform random endpoint
    Random,
    /// Do not proxy; the caller forwards the original destination
    #[serde(rename = "PASSTHROUGH")]
    Passthrough,
}

/// Consistent-hash load-balancer settings
///
/// The hash key for a request is resolved in order: the named header, then
/// the named query parameter, then (when `use_source_ip` is set) the source
/// IP. With no resolvable key the selection degrades to uniform random.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistentHashLb {
    /// Header whose value keys the hash
    #[serde(default)]
    pub http_header_name: String,
    /// Fall back to the client source IP as the hash key
    #[serde(default)]
    pub use_source_ip: bool,
    /// Query parameter whose value keys the hash
    #[serde(default)]
    pub http_query_parameter_name: String,
    /// Lower bound on the number of virtual nodes in the ring (default: 1024)
    #[serde(default = "default_minimum_ring_size")]
    pub minimum_ring_size: u32,
}

impl Default for ConsistentHashLb {
    fn default() -> Self {
        Self {
            http_header_name: String::new(),
            use_source_ip: false,
            http_query_parameter_name: String::new(),
            minimum_ring_size: default_minimum_ring_size(),
        }
    }
}

fn default_minimum_ring_size() -> u32 {
    1024
}

/// Load-balancer selection for a cluster or service
///
/// At most one of `simple` and `consistent_hash` may be specified. With
/// neither present the effective policy is `ROUND_ROBIN`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSettings {
    /// One of the fixed simple policies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimpleLb>,
    /// Consistent-hash policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_hash: Option<ConsistentHashLb>,
}

impl LoadBalancerSettings {
    /// True when both variants are configured at once
    pub fn is_ambiguous(&self) -> bool {
        self.simple.is_some() && self.consistent_hash.is_some()
    }

    /// The effective simple policy, defaulting to round robin
    pub fn effective_simple(&self) -> SimpleLb {
        self.simple.unwrap_or_default()
    }
}

/// Traffic policy attached to a cluster or service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicy {
    /// Load-balancer selection
    #[serde(default)]
    pub load_balancer: LoadBalancerSettings,
}
