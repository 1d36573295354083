//! Request matching
//!
//! Walks the snapshot's rules for the request's service and resolves the
//! first fully satisfied match clause to a concrete endpoint. Rule order
//! encodes priority, route order encodes variant precedence, clauses within
//! a route are OR-joined and predicates within a clause are AND-joined.

use std::time::Duration;

use tracing::debug;

use crate::config::models::{Endpoint, HttpMatchRequest, StringMatch};
use crate::core::router::error::MatchError;
use crate::core::router::request::RouteRequest;
use crate::core::router::router::Router;
use crate::core::router::snapshot::{Maps, RouteEntry, ServiceEntry};

/// Outcome of a successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// The backend endpoint to dial
    pub endpoint: Endpoint,
    /// Timeout hint from the matched route; enforced by the caller, not here
    pub timeout: Option<Duration>,
}

impl Router {
    /// Resolve a request to a backend endpoint
    ///
    /// The snapshot current at entry is used for the whole call, so a
    /// concurrent reload can never tear the decision.
    pub fn match_request(&self, request: &RouteRequest) -> Result<RouteDecision, MatchError> {
        let maps = self.snapshot();
        match_on(&maps, request)
    }
}

/// Match against one specific snapshot
pub(crate) fn match_on(maps: &Maps, request: &RouteRequest) -> Result<RouteDecision, MatchError> {
    let service = maps
        .service(request.host())
        .ok_or_else(|| MatchError::NoService(request.host().to_string()))?;

    let rules = match maps.rules(&service.name) {
        Some(rules) if !rules.is_empty() => rules,
        _ => return match_without_rules(maps, service, request),
    };

    for rule in rules {
        for route in &rule.routes {
            // A route with no clauses never matches.
            for clause in &route.matches {
                if clause_matches(clause, request) {
                    debug!(
                        rule = %rule.name,
                        route = %route.name,
                        "match clause satisfied"
                    );
                    return select_route(maps, service, route, request);
                }
            }
        }
    }
    Err(MatchError::NoEndpoint)
}

/// A service without rules serves straight from its endpoint index
fn match_without_rules(
    maps: &Maps,
    service: &ServiceEntry,
    request: &RouteRequest,
) -> Result<RouteDecision, MatchError> {
    let endpoints = maps.endpoints(&service.name);
    if endpoints.is_empty() {
        return Err(MatchError::NoCluster(service.name.clone()));
    }
    if service.balancer.is_passthrough() {
        return Err(MatchError::PassThrough);
    }
    let endpoint = service
        .balancer
        .select(&endpoints, Some(request))
        .map_err(|_| MatchError::NoEndpoint)?;
    Ok(RouteDecision {
        endpoint,
        timeout: None,
    })
}

/// Resolve a matched route: pick a weighted cluster, then its endpoint
fn select_route(
    maps: &Maps,
    service: &ServiceEntry,
    route: &RouteEntry,
    request: &RouteRequest,
) -> Result<RouteDecision, MatchError> {
    let cluster_name = route
        .balancer
        .select()
        .map_err(|_| MatchError::NoEndpoint)?;
    let cluster = maps
        .cluster(&service.name, &cluster_name)
        .ok_or_else(|| MatchError::ClusterNotFound(cluster_name.clone()))?;

    // Pass-through is signaled, not selected.
    if cluster.balancer.is_passthrough() {
        return Err(MatchError::PassThrough);
    }

    let endpoint = cluster
        .balancer
        .select(&cluster.endpoints, Some(request))
        .map_err(|_| MatchError::NoEndpoint)?;
    Ok(RouteDecision {
        endpoint,
        timeout: route.timeout.map(Duration::from_millis),
    })
}

/// Evaluate one match clause against the request
///
/// Unspecified predicates never constrain; any matching negative header
/// predicate fails the clause.
pub(crate) fn clause_matches(clause: &HttpMatchRequest, request: &RouteRequest) -> bool {
    if eval(&clause.method, request.method(), false) == Some(false) {
        return false;
    }
    if eval(&clause.authority, request.authority(), false) == Some(false) {
        return false;
    }
    if eval(&clause.scheme, request.scheme(), false) == Some(false) {
        return false;
    }
    if eval(&clause.uri, request.uri(), clause.ignore_uri_case) == Some(false) {
        return false;
    }

    for (name, predicate) in &clause.headers {
        if eval(predicate, request.header(name), false) == Some(false) {
            return false;
        }
    }
    for (name, predicate) in &clause.without_headers {
        if eval(predicate, request.header(name), false) == Some(true) {
            return false;
        }
    }
    for (name, predicate) in &clause.query_params {
        if eval(predicate, request.query_param(name), false) == Some(false) {
            return false;
        }
    }

    if clause.port != 0 && clause.port != request.port() {
        return false;
    }
    true
}

/// Evaluate a string predicate
///
/// `None` means the predicate is unspecified and does not constrain. The
/// first non-empty of exact, prefix, regex wins. The regex variant must
/// match the whole value; a pattern that fails to compile evaluates to
/// false (reload-time validation reports it to the operator).
fn eval(predicate: &StringMatch, value: &str, ignore_case: bool) -> Option<bool> {
    if predicate.is_unspecified() {
        return None;
    }

    if !predicate.exact.is_empty() {
        return Some(if ignore_case {
            value.eq_ignore_ascii_case(&predicate.exact)
        } else {
            value == predicate.exact
        });
    }

    if !predicate.prefix.is_empty() {
        return Some(if ignore_case {
            value
                .to_ascii_lowercase()
                .starts_with(&predicate.prefix.to_ascii_lowercase())
        } else {
            value.starts_with(&predicate.prefix)
        });
    }

    let matched = regex::Regex::new(&format!("^(?:{})$", predicate.regex))
        .map(|re| {
            if ignore_case {
                re.is_match(&value.to_ascii_lowercase())
            } else {
                re.is_match(value)
            }
        })
        .unwrap_or(false);
    Some(matched)
}
