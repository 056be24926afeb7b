//! # GameLink Domain
//!
//! Data types shared by every layer of the dispatch pipeline.
//!
//! This crate contains:
//! - Request descriptors and response envelopes
//! - Authentication payloads and stored refresh material
//! - Domain error types and Result definitions
//! - Configuration structures and pipeline constants
//!
//! ## Architecture
//! - No dependencies on other GameLink crates
//! - No I/O: pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
