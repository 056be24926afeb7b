//! # GameLink Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed `Transport`
//! - Configuration loading (environment and JSON/TOML files)
//! - Tracing subscriber setup
//! - The `GameLinkClient` facade
//!
//! ## Architecture
//! - Implements traits defined in `gamelink-core`
//! - Contains all "impure" code (network I/O, files, global subscriber)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::GameLinkClient;
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::init_tracing;
