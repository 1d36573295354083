//! Routing and load-balancing engine
//!
//! ## Module Structure
//!
//! - `error` - Match and balancer error sentinels
//! - `request` - The request view consumed by the matcher
//! - `balancer` - Endpoint selectors (round robin, random, least-conn,
//!   pass-through, consistent hash)
//! - `weighted` - Smooth weighted round robin over route destinations
//! - `ring` - The consistent-hash ring
//! - `snapshot` - Indexed `Maps` snapshot and the copy-on-write store
//! - `builder` - `ProxyConfig` to `Maps` transformation with validation
//! - `matcher` - Predicate evaluation and the match walk
//! - `router` - The `Router` value tying store, reload and cache together

pub mod balancer;
pub mod builder;
pub mod error;
pub mod matcher;
pub mod request;
pub mod ring;
pub mod router;
pub mod snapshot;
pub mod weighted;

#[cfg(test)]
mod tests;

pub use balancer::EndpointBalancer;
pub use builder::build_maps;
pub use error::{BalancerError, MatchError};
pub use matcher::RouteDecision;
pub use request::RouteRequest;
pub use ring::HashRing;
pub use router::{BootstrapOptions, Router};
pub use snapshot::{ClusterEntry, CowMaps, Maps, RouteEntry, RuleEntry, ServiceEntry};
pub use weighted::WeightedRoundRobin;
