//! Error types for loginswarm
//!
//! Only orchestration-level faults live here. Per-probe faults are carried as
//! `anyhow::Error` inside probers and never leave a probe task.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwarmError {
    /// Rejected request parameters; no task was scheduled.
    #[error("{0}")]
    Validation(String),

    #[error("Orchestration error: {0}")]
    Orchestration(String),

    #[error("Event stream error: {0}")]
    Publish(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SwarmError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SwarmError::Validation(_))
    }
}

/// Result type alias for loginswarm operations
pub type SwarmResult<T> = Result<T, SwarmError>;
