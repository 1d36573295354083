//! Copy-on-write routing snapshot
//!
//! [`Maps`] is the complete routing configuration in indexed form. A
//! snapshot is built once, published through [`CowMaps`] and never mutated
//! afterwards; readers obtain it with a single atomic load and keep serving
//! from it until they drop their reference, so a reload can never tear a
//! request that is already in flight.
//!
//! The snapshot also serializes to JSON for the warm-start cache file.
//! Balancers are skipped there, since their state is runtime-only, and are
//! rebuilt deterministically after a cache load via
//! [`Maps::rebuild_balancers`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::models::{
    Endpoint, HttpMatchRequest, HttpRedirect, HttpRewrite, HttpRouteDestination, TrafficPolicy,
};
use crate::core::router::balancer::EndpointBalancer;
use crate::core::router::weighted::WeightedRoundRobin;

/// A service registered in the snapshot
///
/// Shared by every host that resolves to the service, so the service-level
/// balancer state is common to all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Service name
    pub name: String,
    /// Hosts that resolve here
    pub hosts: Vec<String>,
    /// Service-level traffic policy, when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
    /// Balancer used when the service has no rules (default: round robin)
    #[serde(skip)]
    pub balancer: EndpointBalancer,
}

/// A cluster registered in the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// Cluster name, unique within its service
    pub name: String,
    /// Ordered backend endpoints
    pub endpoints: Vec<Endpoint>,
    /// The cluster's traffic policy
    #[serde(default)]
    pub traffic_policy: TrafficPolicy,
    /// Endpoint selector derived from the traffic policy
    #[serde(skip)]
    pub balancer: EndpointBalancer,
}

/// One routing rule with its routes, in evaluation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Rule name, informational
    pub name: String,
    /// Routes evaluated in order
    pub routes: Vec<RouteEntry>,
}

/// One route inside a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Route name, informational
    pub name: String,
    /// OR-joined match clauses
    pub matches: Vec<HttpMatchRequest>,
    /// Weighted destinations the route selector was built from
    pub destinations: Vec<HttpRouteDestination>,
    /// Redirect directive carried for the enclosing proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<HttpRedirect>,
    /// Rewrite directive carried for the enclosing proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<HttpRewrite>,
    /// Timeout hint in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Cluster selector over the destinations
    #[serde(skip)]
    pub balancer: WeightedRoundRobin,
}

/// The complete, immutable routing configuration in indexed form
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Maps {
    /// host -> service entry
    #[serde(rename = "serviceMap")]
    pub(crate) service_map: IndexMap<String, Arc<ServiceEntry>>,
    /// service name -> ordered rules
    #[serde(rename = "ruleMap")]
    pub(crate) rule_map: IndexMap<String, Vec<RuleEntry>>,
    /// service name -> ("ip:port" -> endpoint), insertion-ordered
    #[serde(rename = "endpoints")]
    pub(crate) endpoint_index: IndexMap<String, IndexMap<String, Endpoint>>,
    /// service name -> (cluster name -> cluster entry), insertion-ordered
    #[serde(rename = "clusters")]
    pub(crate) cluster_index: IndexMap<String, IndexMap<String, ClusterEntry>>,
}

impl Maps {
    /// Service entry for a request host
    pub fn service(&self, host: &str) -> Option<&Arc<ServiceEntry>> {
        self.service_map.get(host)
    }

    /// Rules registered for a service name
    pub fn rules(&self, service: &str) -> Option<&[RuleEntry]> {
        self.rule_map.get(service).map(Vec::as_slice)
    }

    /// Rules for the service a host resolves to
    pub fn service_rules(&self, host: &str) -> Option<&[RuleEntry]> {
        self.rules(&self.service(host)?.name)
    }

    /// All endpoints of a service, in registration order
    pub fn endpoints(&self, service: &str) -> Vec<Endpoint> {
        self.endpoint_index
            .get(service)
            .map(|index| index.values().cloned().collect())
            .unwrap_or_default()
    }

    /// A cluster of a service by name
    pub fn cluster(&self, service: &str, name: &str) -> Option<&ClusterEntry> {
        self.cluster_index.get(service)?.get(name)
    }

    /// Clusters of a service, in registration order
    pub fn clusters(&self, service: &str) -> Option<&IndexMap<String, ClusterEntry>> {
        self.cluster_index.get(service)
    }

    /// Number of registered hosts
    pub fn host_count(&self) -> usize {
        self.service_map.len()
    }

    /// Rebuild every balancer from the declarative data in the snapshot
    ///
    /// Used after deserializing the cache file, where balancers are not
    /// persisted. Ring layouts come out identical because they are a pure
    /// function of policy and endpoint set.
    pub fn rebuild_balancers(&mut self) {
        for clusters in self.cluster_index.values_mut() {
            for cluster in clusters.values_mut() {
                cluster.balancer = EndpointBalancer::from_settings(
                    &cluster.traffic_policy.load_balancer,
                    &cluster.endpoints,
                );
            }
        }

        let endpoint_index = &self.endpoint_index;
        for entry in self.service_map.values_mut() {
            let service = Arc::make_mut(entry);
            let endpoints: Vec<Endpoint> = endpoint_index
                .get(&service.name)
                .map(|index| index.values().cloned().collect())
                .unwrap_or_default();
            service.balancer = match &service.traffic_policy {
                Some(policy) => {
                    EndpointBalancer::from_settings(&policy.load_balancer, &endpoints)
                }
                None => EndpointBalancer::default(),
            };
        }

        for rules in self.rule_map.values_mut() {
            for rule in rules.iter_mut() {
                for route in rule.routes.iter_mut() {
                    route.balancer = WeightedRoundRobin::new(&route.destinations);
                }
            }
        }
    }
}

// Deep copy. Service entries are re-shared per service name so hosts of one
// service still point at a single entry; balancer Clone impls start the copy
// from neutral selection state.
impl Clone for Maps {
    fn clone(&self) -> Self {
        let mut fresh: IndexMap<String, Arc<ServiceEntry>> = IndexMap::new();
        let service_map = self
            .service_map
            .iter()
            .map(|(host, entry)| {
                let shared = fresh
                    .entry(entry.name.clone())
                    .or_insert_with(|| Arc::new(ServiceEntry::clone(entry)))
                    .clone();
                (host.clone(), shared)
            })
            .collect();

        Self {
            service_map,
            rule_map: self.rule_map.clone(),
            endpoint_index: self.endpoint_index.clone(),
            cluster_index: self.cluster_index.clone(),
        }
    }
}

/// Atomically swappable handle to the current [`Maps`] snapshot
///
/// Readers never block and never observe torn state; writers serialize on
/// an advisory lock, copy the current snapshot, mutate the copy and publish
/// it with one atomic store. The previous snapshot stays alive until the
/// last in-flight reader drops its reference.
#[derive(Debug)]
pub struct CowMaps {
    current: ArcSwap<Maps>,
    write_lock: Mutex<()>,
}

impl CowMaps {
    /// Wrap an initial snapshot
    pub fn new(maps: Maps) -> Self {
        Self {
            current: ArcSwap::from_pointee(maps),
            write_lock: Mutex::new(()),
        }
    }

    /// The current snapshot; one atomic load, never blocks
    pub fn get(&self) -> Arc<Maps> {
        self.current.load_full()
    }

    /// Copy the current snapshot, apply `mutate` to the copy and publish it
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Maps),
    {
        let _guard = self.write_lock.lock();
        let mut draft = Maps::clone(&self.current.load());
        mutate(&mut draft);
        self.current.store(Arc::new(draft));
    }

    /// Publish a fully built snapshot, replacing the current one
    pub fn replace(&self, maps: Maps) {
        let _guard = self.write_lock.lock();
        self.current.store(Arc::new(maps));
    }
}

impl Default for CowMaps {
    fn default() -> Self {
        Self::new(Maps::default())
    }
}
