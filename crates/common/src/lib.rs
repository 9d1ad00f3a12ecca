//! loginswarm common - shared types and traits
//!
//! This crate provides the data model, event payloads, error taxonomy and the
//! `Prober` capability used across the loginswarm crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{SwarmError, SwarmResult};
pub use traits::{ProbeContext, Prober};
pub use types::{
    ProbeOutcome, ProbeRequest, ProbeResult, ProbeStatus, ProbeTimeouts, RunConfig, RunEvent,
    RunSummary, DEFAULT_WORKER_CAP, MAX_NUM_LOGINS,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
