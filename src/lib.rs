//! # meshroute-rs
//!
//! L7 sidecar routing core: match an incoming HTTP request against a
//! service/route configuration and resolve it to a concrete backend
//! endpoint through a load-balancing policy.
//!
//! ## Features
//!
//! - **Lock-free serving**: readers take one atomic load of the current
//!   snapshot and never block, even while a reload is publishing
//! - **Predicate algebra**: URI, scheme, method, authority, headers,
//!   negative headers, query parameters and port, with exact/prefix/regex
//!   string matching
//! - **Pluggable balancing**: round robin, random, least-connection,
//!   pass-through, smooth weighted round robin over route destinations and
//!   consistent hashing
//! - **Transactional reload**: a new configuration is published whole or
//!   not at all
//! - **Warm start**: best-effort JSON cache of the indexed snapshot
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshroute_rs::{ProxyConfig, RouteRequest, Router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProxyConfig::from_file("routing.yaml").await?;
//!     let router = Router::with_config(&config)?;
//!
//!     let request = RouteRequest::new("catalog.local")
//!         .with_method("GET")
//!         .with_uri("/api/items?page=1");
//!     let decision = router.match_request(&request)?;
//!     println!("proxy to {}", decision.endpoint);
//!     Ok(())
//! }
//! ```
//!
//! The HTTP server, TLS termination, request parsing and the auto-save
//! timer are the embedding proxy's concern; this crate only consumes the
//! parsed request view and the parsed configuration document.

pub mod config;
pub mod core;

pub use config::{ConfigError, ProxyConfig};
pub use core::router::{
    BalancerError, BootstrapOptions, MatchError, Maps, RouteDecision, RouteRequest, Router,
};
