//! Weighted route-destination selector
//!
//! Smooth weighted round robin: every selection adds each destination's
//! weight to its current value, picks the largest current (ties resolved
//! toward the later entry) and subtracts the weight total from the winner.
//! Over any window of weight-total consecutive selections each destination
//! is chosen exactly its weight number of times, spaced as evenly as the
//! weights allow.

use parking_lot::Mutex;

use crate::config::models::HttpRouteDestination;
use crate::core::router::error::BalancerError;

#[derive(Debug, Clone)]
struct WeightedEntry {
    cluster: String,
    weight: i64,
    current: i64,
}

/// Selector over `(cluster, weight)` pairs
///
/// Destinations with weight <= 0 or an empty cluster name are dropped at
/// construction.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    entries: Mutex<Vec<WeightedEntry>>,
}

impl WeightedRoundRobin {
    /// Build the selector from a route's destination list
    pub fn new(destinations: &[HttpRouteDestination]) -> Self {
        let entries = destinations
            .iter()
            .filter(|d| d.weight > 0 && !d.destination.cluster.is_empty())
            .map(|d| WeightedEntry {
                cluster: d.destination.cluster.clone(),
                weight: i64::from(d.weight),
                current: 0,
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// True when every destination was dropped at construction
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Select the next cluster name
    pub fn select(&self) -> Result<String, BalancerError> {
        let mut entries = self.entries.lock();
        if entries.is_empty() {
            return Err(BalancerError::EmptyCandidates);
        }

        let total: i64 = entries.iter().map(|e| e.weight).sum();
        for entry in entries.iter_mut() {
            entry.current += entry.weight;
        }

        let mut best = 0;
        for i in 1..entries.len() {
            if entries[i].current >= entries[best].current {
                best = i;
            }
        }
        entries[best].current -= total;
        Ok(entries[best].cluster.clone())
    }
}

// Copies start from a neutral cursor: selector state does not leak across
// snapshot boundaries.
impl Clone for WeightedRoundRobin {
    fn clone(&self) -> Self {
        let entries = self
            .entries
            .lock()
            .iter()
            .map(|e| WeightedEntry {
                cluster: e.cluster.clone(),
                weight: e.weight,
                current: 0,
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}
