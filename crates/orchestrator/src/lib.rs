//! Orchestrator - bounded-concurrency probe runs with streamed progress

mod orchestrator;
mod pool;
mod progress;
mod publisher;
mod task;

pub use orchestrator::{
    validate_num_logins, Orchestrator, INVALID_VALUE_MESSAGE, NON_POSITIVE_MESSAGE,
};
pub use pool::{CompletionStream, PoolStats, WorkerPool};
pub use progress::ProgressAggregator;
pub use publisher::{EventStream, PublishError, StreamPublisher, StreamState};
pub use task::{CleanupOutcome, ProbeSession, ProbeTask};

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use loginswarm_common::{ProbeContext, ProbeOutcome, Prober, RunConfig, RunEvent};
    use std::sync::Arc;

    pub(crate) struct AlwaysOk;

    #[async_trait]
    impl Prober for AlwaysOk {
        async fn probe(&self, _ctx: &ProbeContext) -> Result<ProbeOutcome> {
            Ok(ProbeOutcome::success("rack-session-value", "You logged into a secure area!"))
        }

        fn name(&self) -> &str {
            "always-ok"
        }
    }

    #[tokio::test]
    async fn orchestrator_single_login() {
        let orch = Orchestrator::new(Arc::new(AlwaysOk), RunConfig::default());
        let mut stream = orch.start_run(1).unwrap();

        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RunEvent::Start { num_logins: 1, .. }));
        match &events[1] {
            RunEvent::Progress { result } => {
                assert_eq!(result.id, 1);
                assert!(result.is_success());
            }
            other => panic!("expected progress, got {other:?}"),
        }
        match &events[2] {
            RunEvent::Complete(summary) => {
                assert_eq!(summary.success_count, 1);
                assert_eq!(summary.fail_count, 0);
                assert_eq!(summary.success_rate, 100.0);
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }
}
