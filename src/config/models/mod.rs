//! Configuration document model
//!
//! Serde-backed types mirroring the YAML routing document: services own
//! clusters and rules, clusters own endpoints, rules own routes with their
//! match clauses and weighted destinations.

pub mod policy;
pub mod route;
pub mod service;

pub use policy::{ConsistentHashLb, LoadBalancerSettings, SimpleLb, TrafficPolicy};
pub use route::{
    Destination, HttpMatchRequest, HttpRedirect, HttpRewrite, HttpRoute, HttpRouteDestination,
    RouteRule, StringMatch,
};
pub use service::{Cluster, Endpoint, Service};

use serde::{Deserialize, Serialize};

/// The root of the routing configuration document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Services with their hosts, clusters and service-local rules
    #[serde(default)]
    pub services: Vec<Service>,
    /// Rules declared at the top level; each targets a service by
    /// `serviceName` and is appended to that service's rule list
    #[serde(default)]
    pub rules: Vec<RouteRule>,
}
