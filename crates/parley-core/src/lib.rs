//! Parley core — transcript types, the provider registry, and the layered
//! configuration resolver.
//!
//! Everything that talks to the network lives in `parley-providers`; this
//! crate is pure data and filesystem.

pub mod config;
pub mod registry;
pub mod types;
