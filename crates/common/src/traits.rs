//! Core traits for loginswarm components

use crate::types::{ProbeOutcome, ProbeTimeouts};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything a prober gets to know about the attempt it is running.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub id: u32,
    /// Scratch directory owned by this attempt alone (browser profile, cookies, downloads).
    pub workspace: PathBuf,
    pub timeouts: ProbeTimeouts,
}

impl ProbeContext {
    #[inline]
    #[must_use]
    pub fn new(id: u32, workspace: PathBuf, timeouts: ProbeTimeouts) -> Self {
        Self {
            id,
            workspace,
            timeouts,
        }
    }
}

/// Probe execution capability - performs one login attempt.
///
/// An `Err` means the attempt faulted (navigation failure, missing element,
/// timeout...). A completed attempt that was refused is an `Ok` outcome with
/// `success == false`. Either way the caller turns it into a `ProbeResult`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ctx: &ProbeContext) -> Result<ProbeOutcome>;

    /// Prober name/identifier
    fn name(&self) -> &str;
}
