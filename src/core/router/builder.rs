//! Snapshot builder
//!
//! Pure transformation of a parsed [`ProxyConfig`] into an indexed
//! [`Maps`]. Validation runs first over the whole document, so a reload is
//! transactional: any error leaves the previously published snapshot
//! standing.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::models::*;
use crate::config::ConfigError;
use crate::core::router::balancer::EndpointBalancer;
use crate::core::router::snapshot::{ClusterEntry, Maps, RouteEntry, RuleEntry, ServiceEntry};
use crate::core::router::weighted::WeightedRoundRobin;

/// Build an indexed snapshot from a configuration document
pub fn build_maps(config: &ProxyConfig) -> Result<Maps, ConfigError> {
    validate(config)?;

    let mut maps = Maps::default();
    for service in &config.services {
        let mut endpoint_map = IndexMap::new();
        let mut cluster_map = IndexMap::new();

        for cluster in &service.clusters {
            for endpoint in &cluster.endpoints {
                endpoint_map.insert(endpoint.key(), endpoint.clone());
            }
            let balancer = EndpointBalancer::from_settings(
                &cluster.traffic_policy.load_balancer,
                &cluster.endpoints,
            );
            cluster_map.insert(
                cluster.name.clone(),
                ClusterEntry {
                    name: cluster.name.clone(),
                    endpoints: cluster.endpoints.clone(),
                    traffic_policy: cluster.traffic_policy.clone(),
                    balancer,
                },
            );
        }

        let service_endpoints: Vec<Endpoint> = endpoint_map.values().cloned().collect();
        let balancer = match &service.traffic_policy {
            Some(policy) => {
                EndpointBalancer::from_settings(&policy.load_balancer, &service_endpoints)
            }
            None => EndpointBalancer::default(),
        };
        let entry = Arc::new(ServiceEntry {
            name: service.name.clone(),
            hosts: service.hosts.clone(),
            traffic_policy: service.traffic_policy.clone(),
            balancer,
        });
        for host in &service.hosts {
            maps.service_map.insert(host.clone(), entry.clone());
        }

        maps.endpoint_index
            .insert(service.name.clone(), endpoint_map);
        maps.cluster_index.insert(service.name.clone(), cluster_map);

        // Service-local rules first, then top-level rules targeting this
        // service, preserving declaration order within each group.
        let mut rules: Vec<RuleEntry> = service.rules.iter().map(build_rule).collect();
        rules.extend(
            config
                .rules
                .iter()
                .filter(|rule| rule.service_name == service.name)
                .map(build_rule),
        );
        if !rules.is_empty() {
            maps.rule_map.insert(service.name.clone(), rules);
        }
    }

    debug!(
        hosts = maps.host_count(),
        services = config.services.len(),
        "snapshot built"
    );
    Ok(maps)
}

fn build_rule(rule: &RouteRule) -> RuleEntry {
    RuleEntry {
        name: rule.name.clone(),
        routes: rule
            .http
            .iter()
            .map(|route| RouteEntry {
                name: route.name.clone(),
                matches: route.matches.clone(),
                destinations: route.route.clone(),
                redirect: route.redirect.clone(),
                rewrite: route.rewrite.clone(),
                timeout: route.timeout,
                balancer: WeightedRoundRobin::new(&route.route),
            })
            .collect(),
    }
}

/// Structural validation over the whole document
fn validate(config: &ProxyConfig) -> Result<(), ConfigError> {
    let mut host_owners: HashMap<&str, &str> = HashMap::new();

    for service in &config.services {
        for host in &service.hosts {
            if let Some(first) = host_owners.insert(host.as_str(), service.name.as_str()) {
                if first != service.name {
                    return Err(ConfigError::ConflictingHost {
                        host: host.clone(),
                        first: first.to_string(),
                        second: service.name.clone(),
                    });
                }
            }
        }

        if let Some(policy) = &service.traffic_policy {
            validate_lb_settings(&policy.load_balancer, &service.name, "service")?;
        }

        for cluster in &service.clusters {
            validate_lb_settings(
                &cluster.traffic_policy.load_balancer,
                &service.name,
                &format!("cluster {}", cluster.name),
            )?;
            let passthrough = cluster.traffic_policy.load_balancer.consistent_hash.is_none()
                && cluster.traffic_policy.load_balancer.effective_simple()
                    == SimpleLb::Passthrough;
            if cluster.endpoints.is_empty() && !passthrough {
                return Err(ConfigError::EmptyCluster {
                    service: service.name.clone(),
                    cluster: cluster.name.clone(),
                });
            }
        }

        for rule in &service.rules {
            validate_rule(rule, service)?;
        }
    }

    for rule in &config.rules {
        let service = config
            .services
            .iter()
            .find(|service| service.name == rule.service_name)
            .ok_or_else(|| ConfigError::UnknownRuleService {
                rule: rule.name.clone(),
                service: rule.service_name.clone(),
            })?;
        validate_rule(rule, service)?;
    }

    Ok(())
}

fn validate_lb_settings(
    settings: &LoadBalancerSettings,
    service: &str,
    scope: &str,
) -> Result<(), ConfigError> {
    if settings.is_ambiguous() {
        return Err(ConfigError::AmbiguousLoadBalancer {
            service: service.to_string(),
            scope: scope.to_string(),
        });
    }
    if let Some(hash) = &settings.consistent_hash {
        if hash.minimum_ring_size < 1 {
            return Err(ConfigError::InvalidRingSize {
                service: service.to_string(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_rule(rule: &RouteRule, service: &Service) -> Result<(), ConfigError> {
    for route in &rule.http {
        for destination in &route.route {
            let cluster = &destination.destination.cluster;
            if cluster.is_empty() {
                continue;
            }
            if !service.clusters.iter().any(|c| &c.name == cluster) {
                return Err(ConfigError::UnknownCluster {
                    service: service.name.clone(),
                    cluster: cluster.clone(),
                });
            }
        }
        for clause in &route.matches {
            validate_clause(clause, &service.name)?;
        }
    }
    Ok(())
}

fn validate_clause(clause: &HttpMatchRequest, service: &str) -> Result<(), ConfigError> {
    if clause.port < 0 {
        return Err(ConfigError::NegativePort {
            service: service.to_string(),
            port: clause.port,
        });
    }
    for predicate in [&clause.uri, &clause.scheme, &clause.method, &clause.authority]
        .into_iter()
        .chain(clause.headers.values())
        .chain(clause.without_headers.values())
        .chain(clause.query_params.values())
    {
        if !predicate.regex.is_empty() {
            regex::Regex::new(&predicate.regex).map_err(|source| ConfigError::InvalidRegex {
                service: service.to_string(),
                pattern: predicate.regex.clone(),
                source,
            })?;
        }
    }
    Ok(())
}
