//! Reload and snapshot-consistency tests

use std::sync::Arc;

use super::router_tests::{router_from_yaml, two_endpoint_router};
use crate::config::ProxyConfig;
use crate::core::router::matcher::match_on;
use crate::core::router::request::RouteRequest;
use crate::core::router::router::Router;

const V2: &str = r#"
services:
  - name: s
    hosts: [h]
    clusters:
      - name: c
        endpoints:
          - { ip: 192.168.0.1, port: "9" }
"#;

#[test]
fn test_every_host_resolves_after_reload() {
    let router = router_from_yaml(
        r#"
services:
  - name: catalog
    hosts: [catalog.local, catalog.internal]
    clusters:
      - name: c
        endpoints: [{ ip: 10.0.0.1, port: "1" }]
  - name: billing
    hosts: [billing.local]
    clusters:
      - name: c
        endpoints: [{ ip: 10.0.0.2, port: "2" }]
"#,
    );

    let snapshot = router.snapshot();
    for (host, service) in [
        ("catalog.local", "catalog"),
        ("catalog.internal", "catalog"),
        ("billing.local", "billing"),
    ] {
        assert_eq!(snapshot.service(host).expect("service").name, service);
    }
}

#[test]
fn test_in_flight_reader_keeps_its_snapshot() {
    let router = two_endpoint_router();

    // A request handler acquired the snapshot, then a reload lands before
    // it finishes matching.
    let held = router.snapshot();
    let config = ProxyConfig::from_yaml(V2).expect("parse");
    router.reload(&config).expect("reload");

    let request = RouteRequest::new("h");
    let decision = match_on(&held, &request).expect("match");
    assert!(
        ["10.0.0.1", "10.0.0.2"].contains(&decision.endpoint.ip.as_str()),
        "decision must come from the held snapshot, got {}",
        decision.endpoint
    );

    // New readers see the new world.
    let fresh = router.match_request(&request).expect("match");
    assert_eq!(fresh.endpoint.ip, "192.168.0.1");
}

#[test]
fn test_failed_reload_keeps_old_snapshot() {
    let router = two_endpoint_router();

    let broken = ProxyConfig::from_yaml(
        r#"
services:
  - name: s
    hosts: [h]
    clusters:
      - name: c
        endpoints: [{ ip: 10.0.0.1, port: "1" }]
    rules:
      - name: r
        http:
          - match: [{ uri: { regex: "([bad" } }]
            route: [{ destination: { cluster: c }, weight: 1 }]
"#,
    )
    .expect("parse");
    assert!(router.reload(&broken).is_err());

    // The previous configuration still serves.
    let request = RouteRequest::new("h");
    assert!(router.match_request(&request).is_ok());
    assert_eq!(router.snapshot().host_count(), 1);
}

#[test]
fn test_match_never_observes_torn_state() {
    // V1 gates everything behind POST; V2 has no rules at all. A torn view
    // (V2 service with V1 rules, or the reverse) would surface as a GET
    // request landing on the V1 endpoint.
    let v1 = ProxyConfig::from_yaml(
        r#"
services:
  - name: s
    hosts: [h]
    clusters:
      - name: c
        endpoints: [{ ip: 10.0.0.1, port: "1" }]
    rules:
      - name: writes-only
        http:
          - match: [{ method: { exact: POST } }]
            route: [{ destination: { cluster: c }, weight: 1 }]
"#,
    )
    .expect("parse");
    let v2 = ProxyConfig::from_yaml(V2).expect("parse");

    let router = Arc::new(Router::with_config(&v1).expect("build"));

    let writer = {
        let router = Arc::clone(&router);
        let (v1, v2) = (v1.clone(), v2.clone());
        std::thread::spawn(move || {
            for i in 0..200 {
                let config = if i % 2 == 0 { &v2 } else { &v1 };
                router.reload(config).expect("reload");
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                let request = RouteRequest::new("h").with_method("GET");
                for _ in 0..500 {
                    match router.match_request(&request) {
                        // Only V2 serves GET, and only from its endpoint.
                        Ok(decision) => assert_eq!(decision.endpoint.ip, "192.168.0.1"),
                        Err(error) => assert_eq!(
                            error,
                            crate::core::router::error::MatchError::NoEndpoint
                        ),
                    }
                }
            })
        })
        .collect();

    writer.join().expect("writer");
    for reader in readers {
        reader.join().expect("reader");
    }
}

#[test]
fn test_update_mutator_does_not_disturb_readers() {
    let router = two_endpoint_router();
    let held = router.snapshot();

    router.update(|draft| {
        draft.rule_map.clear();
        draft.service_map.clear();
    });

    assert!(held.service("h").is_some());
    assert!(router.snapshot().service("h").is_none());
}
