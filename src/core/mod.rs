//! Core routing engine

pub mod router;
