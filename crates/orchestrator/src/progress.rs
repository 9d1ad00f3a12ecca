//! Progress aggregation
//!
//! Collects results as they arrive (completion order) and turns them into a
//! `RunSummary` once the last one is in.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use loginswarm_common::{ProbeResult, RunSummary};

pub struct ProgressAggregator {
    requested: u32,
    results: Mutex<Vec<ProbeResult>>,
}

impl ProgressAggregator {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// Append one finished result. Safe to call from several workers.
    pub async fn record(&self, result: ProbeResult) -> usize {
        let mut results = self.results.lock().await;
        results.push(result);
        results.len()
    }

    pub async fn completed(&self) -> usize {
        self.results.lock().await.len()
    }

    pub async fn succeeded(&self) -> usize {
        self.results.lock().await.iter().filter(|r| r.is_success()).count()
    }

    pub async fn failed(&self) -> usize {
        self.results.lock().await.iter().filter(|r| !r.is_success()).count()
    }

    pub async fn is_finished(&self) -> bool {
        self.completed().await >= self.requested as usize
    }

    /// Build the summary: results sorted by id, rate over the requested count.
    pub async fn finish(&self, total_elapsed: Duration) -> RunSummary {
        let results = self.results.lock().await.clone();
        let summary = RunSummary::from_results(self.requested, results, total_elapsed);

        info!("Run Summary:");
        info!("  Requested logins: {}", self.requested);
        info!("  Succeeded: {}", summary.success_count);
        info!("  Failed: {}", summary.fail_count);
        info!("  Success rate: {:.1}%", summary.success_rate);
        info!("  Total time: {:.2}s", summary.total_time);
        summary
    }
}
