//! Endpoint load balancers
//!
//! The balancer family is a closed set, so it is modeled as an enum rather
//! than trait objects. Mutable selection state (the round-robin cursor, the
//! least-connection counters) lives inside the balancer values owned by the
//! current snapshot and advances atomically under concurrent selects.
//! Copying a snapshot copies the balancers through [`Clone`] impls that
//! reset that state; the hash ring is carried as-is because its layout is
//! deterministic in the endpoint set.

use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

use dashmap::DashMap;
use rand::Rng;

use crate::config::models::{Endpoint, LoadBalancerSettings, SimpleLb};
use crate::core::router::error::BalancerError;
use crate::core::router::request::RouteRequest;
use crate::core::router::ring::HashRing;

/// Round-robin cursor
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    fn select<'a>(&self, candidates: &'a [Endpoint]) -> &'a Endpoint {
        // fetch_add gives every concurrent caller a distinct tick; over k*n
        // calls each candidate is returned exactly k times.
        let index = self.cursor.fetch_add(1, Relaxed) % candidates.len();
        &candidates[index]
    }
}

impl Clone for RoundRobin {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// Least-connection accounting
///
/// The caller drives the counters through [`EndpointBalancer::acquire`] on
/// dispatch and [`EndpointBalancer::release`] on completion. With no
/// accounting wired every counter reads zero and the first candidate wins.
#[derive(Debug, Default)]
pub struct LeastConn {
    active: DashMap<String, AtomicUsize>,
}

impl LeastConn {
    fn select<'a>(&self, candidates: &'a [Endpoint]) -> &'a Endpoint {
        let mut best = &candidates[0];
        let mut best_active = self.active_for(best);
        for candidate in &candidates[1..] {
            let active = self.active_for(candidate);
            // Strict comparison keeps the earliest candidate on ties.
            if active < best_active {
                best = candidate;
                best_active = active;
            }
        }
        best
    }

    fn active_for(&self, endpoint: &Endpoint) -> usize {
        self.active
            .get(&endpoint.key())
            .map(|counter| counter.load(Relaxed))
            .unwrap_or(0)
    }

    fn acquire(&self, endpoint: &Endpoint) {
        let counter = self
            .active
            .entry(endpoint.key())
            .or_insert_with(|| AtomicUsize::new(0));
        counter.fetch_add(1, Relaxed);
    }

    fn release(&self, endpoint: &Endpoint) {
        if let Some(counter) = self.active.get(&endpoint.key()) {
            let _ = counter.fetch_update(Relaxed, Relaxed, |v| v.checked_sub(1));
        }
    }
}

impl Clone for LeastConn {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// The fixed family of endpoint selectors
#[derive(Debug, Clone)]
pub enum EndpointBalancer {
    /// Cycle through candidates in order
    RoundRobin(RoundRobin),
    /// Uniform random candidate
    Random,
    /// Candidate with the fewest active connections
    LeastConn(LeastConn),
    /// Do not proxy; signaled to the caller as a match-level directive
    Passthrough,
    /// Consistent hashing over a pre-built ring
    ConsistentHash(HashRing),
}

impl Default for EndpointBalancer {
    fn default() -> Self {
        Self::RoundRobin(RoundRobin::default())
    }
}

impl EndpointBalancer {
    /// Build the balancer a settings block asks for
    ///
    /// The endpoint set is needed up front for the consistent-hash ring.
    /// Ambiguous settings are rejected by the snapshot builder before this
    /// runs; with both variants present the ring wins here.
    pub fn from_settings(settings: &LoadBalancerSettings, endpoints: &[Endpoint]) -> Self {
        if let Some(hash) = &settings.consistent_hash {
            return Self::ConsistentHash(HashRing::new(hash.clone(), endpoints));
        }
        match settings.effective_simple() {
            SimpleLb::RoundRobin => Self::RoundRobin(RoundRobin::default()),
            SimpleLb::Random => Self::Random,
            SimpleLb::LeastConn => Self::LeastConn(LeastConn::default()),
            SimpleLb::Passthrough => Self::Passthrough,
        }
    }

    /// True for the pass-through policy
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    /// Select one endpoint from the candidate set
    ///
    /// The request is consulted by the consistent-hash variant for its hash
    /// key; the other variants ignore it. Pass-through never selects: the
    /// matcher turns it into a directive before reaching this point.
    pub fn select(
        &self,
        candidates: &[Endpoint],
        request: Option<&RouteRequest>,
    ) -> Result<Endpoint, BalancerError> {
        if candidates.is_empty() {
            return Err(BalancerError::EmptyCandidates);
        }
        match self {
            Self::RoundRobin(rr) => Ok(rr.select(candidates).clone()),
            Self::Random => {
                let index = rand::thread_rng().gen_range(0..candidates.len());
                Ok(candidates[index].clone())
            }
            Self::LeastConn(lc) => Ok(lc.select(candidates).clone()),
            Self::Passthrough => Err(BalancerError::EmptyCandidates),
            Self::ConsistentHash(ring) => ring.select(request),
        }
    }

    /// Record a dispatched connection (least-connection accounting)
    pub fn acquire(&self, endpoint: &Endpoint) {
        if let Self::LeastConn(lc) = self {
            lc.acquire(endpoint);
        }
    }

    /// Record a completed connection (least-connection accounting)
    pub fn release(&self, endpoint: &Endpoint) {
        if let Self::LeastConn(lc) = self {
            lc.release(endpoint);
        }
    }
}
