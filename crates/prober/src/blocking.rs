//! Adapter for probes that block an OS thread (e.g. a synchronous WebDriver client)

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use loginswarm_common::{ProbeContext, ProbeOutcome, Prober};

/// Runs a blocking probe function on tokio's blocking pool so it never stalls
/// the async workers.
pub struct FnProber<F> {
    name: String,
    probe_fn: Arc<F>,
}

impl<F> FnProber<F>
where
    F: Fn(&ProbeContext) -> Result<ProbeOutcome> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, probe_fn: F) -> Self {
        Self {
            name: name.into(),
            probe_fn: Arc::new(probe_fn),
        }
    }
}

#[async_trait]
impl<F> Prober for FnProber<F>
where
    F: Fn(&ProbeContext) -> Result<ProbeOutcome> + Send + Sync + 'static,
{
    async fn probe(&self, ctx: &ProbeContext) -> Result<ProbeOutcome> {
        let probe_fn = self.probe_fn.clone();
        let ctx = ctx.clone();
        tokio::task::spawn_blocking(move || probe_fn(&ctx))
            .await
            .context("blocking probe did not complete")?
    }

    fn name(&self) -> &str {
        &self.name
    }
}
