//! Router tests
//!
//! End-to-end coverage of matching, weighted routing, reload behavior and
//! the cache file, driven through the public `Router` surface.

mod reload_tests;
mod weighted_routing_tests;
