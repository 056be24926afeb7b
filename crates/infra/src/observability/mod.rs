//! Observability: structured logging via `tracing`

pub mod logging;

pub use logging::{env_filter, init_tracing};
