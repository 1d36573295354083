//! Weighted destination routing tests

use std::collections::HashMap;

use super::router_tests::router_from_yaml;
use crate::core::router::request::RouteRequest;

fn weighted_router() -> crate::core::router::router::Router {
    router_from_yaml(
        r#"
services:
  - name: s
    hosts: [h]
    clusters:
      - name: cA
        endpoints: [{ ip: 10.0.0.1, port: "1" }]
      - name: cB
        endpoints: [{ ip: 10.0.0.2, port: "2" }]
    rules:
      - name: split
        http:
          - match: [{ uri: { prefix: "/" } }]
            route:
              - { destination: { cluster: cA }, weight: 1 }
              - { destination: { cluster: cB }, weight: 3 }
"#,
    )
}

#[test]
fn test_weight_multiset_over_one_window() {
    let router = weighted_router();
    let request = RouteRequest::new("h").with_uri("/");

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..4 {
        let endpoint = router.match_request(&request).expect("match").endpoint;
        *counts.entry(endpoint.ip).or_insert(0) += 1;
    }
    assert_eq!(counts["10.0.0.1"], 1, "cA serves its one share");
    assert_eq!(counts["10.0.0.2"], 3, "cB serves its three shares");
}

#[test]
fn test_smooth_spacing_from_cold_start() {
    let router = weighted_router();
    let request = RouteRequest::new("h").with_uri("/");

    let ips: Vec<String> = (0..4)
        .map(|_| router.match_request(&request).expect("match").endpoint.ip)
        .collect();
    assert_eq!(ips, ["10.0.0.2", "10.0.0.2", "10.0.0.1", "10.0.0.2"]);
}

#[test]
fn test_weight_multiset_across_many_windows() {
    let router = weighted_router();
    let request = RouteRequest::new("h").with_uri("/");

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..40 {
        let endpoint = router.match_request(&request).expect("match").endpoint;
        *counts.entry(endpoint.ip).or_insert(0) += 1;
    }
    assert_eq!(counts["10.0.0.1"], 10);
    assert_eq!(counts["10.0.0.2"], 30);
}

#[test]
fn test_route_with_only_invalid_destinations_yields_no_endpoint() {
    let router = router_from_yaml(
        r#"
services:
  - name: s
    hosts: [h]
    clusters:
      - name: c
        endpoints: [{ ip: 10.0.0.1, port: "1" }]
    rules:
      - name: broken
        http:
          - match: [{ uri: { prefix: "/" } }]
            route: [{ destination: { cluster: c }, weight: 0 }]
"#,
    );
    let request = RouteRequest::new("h").with_uri("/");
    assert_eq!(
        router.match_request(&request),
        Err(crate::core::router::error::MatchError::NoEndpoint)
    );
}
