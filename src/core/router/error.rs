//! Routing error types
//!
//! Stable sentinels surfaced by matching and by the balancers. Callers
//! dispatch on the variant, not on the display text.

/// Errors surfaced by a match attempt
///
/// Every variant except [`MatchError::PassThrough`] is terminal for the
/// request and should cause the caller to emit an HTTP error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// No service is registered for the request host
    #[error("no service for host {0:?}")]
    NoService(String),

    /// The service has no endpoints to serve from
    #[error("no cluster for service {0:?}")]
    NoCluster(String),

    /// The selected destination names a cluster missing from the snapshot
    #[error("cluster {0:?} not found")]
    ClusterNotFound(String),

    /// No rule matched, or the matched cluster produced no endpoint
    #[error("no endpoint")]
    NoEndpoint,

    /// The matched cluster is pass-through: the proxy must forward the
    /// original destination untouched. A directive, not a failure.
    #[error("pass through")]
    PassThrough,
}

/// Errors produced by the load balancers
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BalancerError {
    /// Selection over zero candidates
    #[error("empty candidate set")]
    EmptyCandidates,
}
