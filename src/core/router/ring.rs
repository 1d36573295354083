//! Consistent-hash ring
//!
//! Virtual nodes are placed on a `u64` ring by hashing `"ip:port#i"` with
//! the deterministic SipHash state of [`DefaultHasher::new`], so a ring
//! built from the same endpoint set always has the same layout. Selection
//! walks clockwise from the request key's hash.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::Rng;

use crate::config::models::{ConsistentHashLb, Endpoint};
use crate::core::router::error::BalancerError;
use crate::core::router::request::RouteRequest;

/// A hash ring over a fixed endpoint set
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    settings: ConsistentHashLb,
    ring: BTreeMap<u64, Endpoint>,
}

impl HashRing {
    /// Build a ring with at least `minimum_ring_size` virtual nodes spread
    /// evenly across the endpoints
    pub fn new(settings: ConsistentHashLb, endpoints: &[Endpoint]) -> Self {
        let mut ring = BTreeMap::new();
        if !endpoints.is_empty() {
            let minimum = settings.minimum_ring_size.max(1) as usize;
            let replicas = minimum.div_ceil(endpoints.len());
            for endpoint in endpoints {
                for i in 0..replicas {
                    ring.insert(hash64(&format!("{}#{}", endpoint.key(), i)), endpoint.clone());
                }
            }
        }
        Self { settings, ring }
    }

    /// Number of virtual nodes on the ring
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// True when the ring holds no nodes
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Select the endpoint owning the request's hash key
    ///
    /// With no resolvable key the position is uniform random, degrading to
    /// random selection.
    pub fn select(&self, request: Option<&RouteRequest>) -> Result<Endpoint, BalancerError> {
        if self.ring.is_empty() {
            return Err(BalancerError::EmptyCandidates);
        }
        let point = match self.hash_key(request) {
            Some(key) => hash64(&key),
            None => rand::thread_rng().gen(),
        };
        self.ring
            .range(point..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, endpoint)| endpoint.clone())
            .ok_or(BalancerError::EmptyCandidates)
    }

    /// Resolve the hash key: named header, then named query parameter, then
    /// the source IP when enabled
    fn hash_key(&self, request: Option<&RouteRequest>) -> Option<String> {
        let request = request?;
        if !self.settings.http_header_name.is_empty() {
            let value = request.header(&self.settings.http_header_name);
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        if !self.settings.http_query_parameter_name.is_empty() {
            let value = request.query_param(&self.settings.http_query_parameter_name);
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        if self.settings.use_source_ip {
            if let Some(ip) = request.source_ip() {
                return Some(ip.to_string());
            }
        }
        None
    }
}

fn hash64(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_settings(ring_size: u32) -> ConsistentHashLb {
        ConsistentHashLb {
            http_header_name: "x-user".to_string(),
            minimum_ring_size: ring_size,
            ..Default::default()
        }
    }

    fn endpoints(n: usize) -> Vec<Endpoint> {
        (0..n)
            .map(|i| Endpoint::new(format!("10.0.0.{}", i + 1), format!("{}", 8080 + i)))
            .collect()
    }

    #[test]
    fn test_ring_meets_minimum_size() {
        let ring = HashRing::new(header_settings(64), &endpoints(3));
        assert!(ring.len() >= 64);
    }

    #[test]
    fn test_selection_is_stable_for_fixed_key() {
        let ring = HashRing::new(header_settings(64), &endpoints(3));
        let request = RouteRequest::new("h").with_header("x-user", "alice");

        let first = ring.select(Some(&request)).expect("select");
        for _ in 0..20 {
            assert_eq!(ring.select(Some(&request)).expect("select"), first);
        }
    }

    #[test]
    fn test_removing_endpoint_reassigns_only_its_keys() {
        // One virtual node per endpoint keeps the surviving nodes in place,
        // so only keys owned by the removed endpoint may move.
        let all = endpoints(3);
        let full = HashRing::new(header_settings(1), &all);
        let reduced = HashRing::new(header_settings(1), &all[..2]);

        for i in 0..200 {
            let request =
                RouteRequest::new("h").with_header("x-user", format!("user-{i}"));
            let before = full.select(Some(&request)).expect("select");
            let after = reduced.select(Some(&request)).expect("select");
            if before != all[2] {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_query_param_and_source_ip_fallback() {
        let settings = ConsistentHashLb {
            http_header_name: "x-user".to_string(),
            http_query_parameter_name: "session".to_string(),
            use_source_ip: true,
            minimum_ring_size: 16,
            ..Default::default()
        };
        let ring = HashRing::new(settings, &endpoints(3));

        // No header: the query parameter keys the hash.
        let by_param = RouteRequest::new("h").with_uri("/p?session=s1");
        let chosen = ring.select(Some(&by_param)).expect("select");
        assert_eq!(ring.select(Some(&by_param)).expect("select"), chosen);

        // No header or parameter: the source IP keys the hash.
        let by_ip = RouteRequest::new("h").with_source_ip("192.0.2.7");
        let chosen = ring.select(Some(&by_ip)).expect("select");
        assert_eq!(ring.select(Some(&by_ip)).expect("select"), chosen);
    }

    #[test]
    fn test_empty_ring_is_an_error() {
        let ring = HashRing::new(header_settings(16), &[]);
        let request = RouteRequest::new("h");
        assert_eq!(
            ring.select(Some(&request)),
            Err(BalancerError::EmptyCandidates)
        );
    }
}
