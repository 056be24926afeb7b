//! # GameLink Core
//!
//! Request dispatch pipeline - no HTTP client or platform code.
//!
//! This crate contains:
//! - The per-domain credential store
//! - The dispatcher, refresh coordinator and rate-limit retry queue
//! - Silent refresh strategies and the interactive login flows
//! - The [`Transport`] port the infrastructure layer implements
//!
//! ## Architecture Principles
//! - Only depends on `gamelink-domain`
//! - Network access goes through the `Transport` trait
//! - Every call produces exactly one `ResponseEnvelope`

pub mod auth;
pub mod credentials;
pub mod dispatch;

pub use auth::{AdminLoginRefresh, PlayerSessionRefresh, RefreshFailure, SessionService};
pub use credentials::{CredentialSlot, CredentialStore, SlotSnapshot};
pub use dispatch::{
    Dispatcher, DispatcherBuilder, RateLimitRetryQueue, RefreshCoordinator, RefreshStrategy,
    Transport,
};
