//! Client facade for embedders
//!
//! [`GameLinkClient`] builds the whole pipeline from a `Config`: reqwest
//! transport, credential store, both silent refresh strategies and the
//! rate-limit retry queue.

pub mod client;

pub use client::GameLinkClient;
