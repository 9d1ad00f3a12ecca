//! Simulated prober - stands in for a real login target

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use loginswarm_common::{ProbeContext, ProbeOutcome, Prober};

const FAULTS: &[&str] = &[
    "timed out waiting for element #username",
    "no such element: button[type='submit']",
    "page load timed out",
    "net::ERR_CONNECTION_RESET",
];

/// Sleeps for a random latency, then succeeds or fails.
pub struct SimulatedProber {
    latency_ms: RangeInclusive<u64>,
    failure_rate: f64,
    always_fail: HashSet<u32>,
}

impl SimulatedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        let lo = min.as_millis() as u64;
        let hi = (max.as_millis() as u64).max(lo);
        self.latency_ms = lo..=hi;
        self
    }

    /// Chance in `[0, 1]` that any attempt faults. NaN counts as zero.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// These ids fault on every attempt.
    pub fn failing_ids(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.always_fail.extend(ids);
        self
    }
}

impl Default for SimulatedProber {
    fn default() -> Self {
        Self {
            latency_ms: 200..=1_500,
            failure_rate: 0.0,
            always_fail: HashSet::new(),
        }
    }
}

#[async_trait]
impl Prober for SimulatedProber {
    async fn probe(&self, ctx: &ProbeContext) -> Result<ProbeOutcome> {
        // ThreadRng is not Send; draw everything before the first await
        let (latency, faulted, fault, token) = {
            let mut rng = rand::thread_rng();
            let latency = Duration::from_millis(rng.gen_range(self.latency_ms.clone()));
            let faulted = self.always_fail.contains(&ctx.id) || rng.gen_bool(self.failure_rate);
            let fault = FAULTS[rng.gen_range(0..FAULTS.len())];
            let token = format!("{:032x}", rng.gen::<u128>());
            (latency, faulted, fault, token)
        };

        // Stand-in for a browser profile lock
        tokio::fs::write(ctx.workspace.join("profile.lock"), ctx.id.to_string())
            .await
            .context("Failed to initialise probe workspace")?;

        tokio::time::sleep(latency).await;

        if faulted {
            anyhow::bail!("{fault}");
        }
        Ok(ProbeOutcome::success(token, "You logged into a secure area!"))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
