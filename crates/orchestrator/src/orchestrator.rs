// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - validates run requests and drives a run from start to summary

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use loginswarm_common::{
    ProbeRequest, Prober, RunConfig, RunEvent, RunSummary, SwarmError, SwarmResult,
    MAX_NUM_LOGINS,
};
use crate::pool::WorkerPool;
use crate::progress::ProgressAggregator;
use crate::publisher::{EventStream, PublishError, StreamPublisher};
use crate::task::ProbeTask;

pub const NON_POSITIVE_MESSAGE: &str = "num_logins must be greater than zero";
pub const INVALID_VALUE_MESSAGE: &str = "invalid value for num_logins";

fn too_many() -> SwarmError {
    SwarmError::Validation(format!("num_logins must not exceed {MAX_NUM_LOGINS}"))
}

/// Orchestrator owns the prober and run configuration and starts runs on demand.
#[derive(Clone)]
pub struct Orchestrator {
    prober: Arc<dyn Prober>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(prober: Arc<dyn Prober>, config: RunConfig) -> Self {
        Self { prober, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn prober_name(&self) -> &str {
        self.prober.name()
    }

    /// Start a run and hand back its event stream. The run proceeds on the
    /// runtime; events are queued as they are produced.
    #[instrument(skip(self))]
    pub fn start_run(&self, num_logins: u32) -> SwarmResult<EventStream> {
        if num_logins == 0 {
            return Err(SwarmError::Validation(NON_POSITIVE_MESSAGE.to_string()));
        }
        if num_logins > MAX_NUM_LOGINS {
            return Err(too_many());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SwarmError::Orchestration(format!("no async runtime: {e}")))?;

        let (publisher, stream) = StreamPublisher::channel(self.config.event_buffer);
        let prober = self.prober.clone();
        let config = self.config.clone();
        let run_id = Uuid::new_v4();

        info!(
            "Starting run {} num_logins={} prober={}",
            run_id,
            num_logins,
            prober.name()
        );
        runtime.spawn(async move {
            match drive(prober, config, num_logins, publisher).await {
                Ok(()) => info!("Run {} complete", run_id),
                Err(PublishError::ObserverGone) => {
                    warn!("Run {} abandoned: observer disconnected", run_id)
                }
                Err(e) => warn!("Run {} stopped: {}", run_id, e),
            }
        });

        Ok(stream)
    }

    /// Run to completion and return only the summary.
    pub async fn execute(&self, num_logins: u32) -> SwarmResult<RunSummary> {
        let mut stream = self.start_run(num_logins)?;
        while let Some(event) = stream.next().await {
            if let RunEvent::Complete(summary) = event {
                return Ok(summary);
            }
        }
        Err(SwarmError::Publish("run ended without a summary".to_string()))
    }
}

async fn drive(
    prober: Arc<dyn Prober>,
    config: RunConfig,
    num_logins: u32,
    mut publisher: StreamPublisher,
) -> Result<(), PublishError> {
    let started = Instant::now();
    publisher.start(num_logins).await?;

    let timeouts = config.timeouts;
    let tasks = ProbeRequest::batch(num_logins)
        .map(move |request| ProbeTask::new(request, prober.clone(), timeouts));

    let pool = WorkerPool::new(config.max_concurrency(num_logins));
    let mut completions = pool.run(tasks);
    let aggregator = ProgressAggregator::new(num_logins);

    while let Some(result) = completions.next().await {
        aggregator.record(result.clone()).await;
        publisher.progress(result).await?;
    }

    if !aggregator.is_finished().await {
        error!(
            "Run ended with {} of {} results; missing attempts are left out of the summary",
            aggregator.completed().await,
            num_logins
        );
    }
    let summary = aggregator.finish(started.elapsed()).await;
    publisher.complete(summary).await
}

/// Accepts a JSON integer (or a string holding one) in `1..=MAX_NUM_LOGINS`.
pub fn validate_num_logins(value: &Value) -> SwarmResult<u32> {
    let parsed: i64 = match value {
        Value::Null => 0,
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| SwarmError::Validation(INVALID_VALUE_MESSAGE.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| SwarmError::Validation(INVALID_VALUE_MESSAGE.to_string()))?,
        _ => return Err(SwarmError::Validation(INVALID_VALUE_MESSAGE.to_string())),
    };

    if parsed <= 0 {
        return Err(SwarmError::Validation(NON_POSITIVE_MESSAGE.to_string()));
    }
    if parsed > i64::from(MAX_NUM_LOGINS) {
        return Err(too_many());
    }
    u32::try_from(parsed).map_err(|_| SwarmError::Validation(INVALID_VALUE_MESSAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_num_logins() {
        assert_eq!(validate_num_logins(&json!(3)).unwrap(), 3);
        assert_eq!(validate_num_logins(&json!(" 12 ")).unwrap(), 12);

        let zero = validate_num_logins(&json!(0)).unwrap_err();
        assert_eq!(zero.to_string(), NON_POSITIVE_MESSAGE);
        let negative = validate_num_logins(&json!(-5)).unwrap_err();
        assert_eq!(negative.to_string(), NON_POSITIVE_MESSAGE);
        assert!(validate_num_logins(&Value::Null).unwrap_err().is_validation());

        for bad in [json!(2.5), json!("ten"), json!([1]), json!(true), json!(u64::MAX)] {
            let err = validate_num_logins(&bad).unwrap_err();
            assert_eq!(err.to_string(), INVALID_VALUE_MESSAGE, "input {bad}");
        }
    }

    #[test]
    fn oversized_runs_are_rejected() {
        let limit = i64::from(MAX_NUM_LOGINS);
        assert_eq!(validate_num_logins(&json!(limit)).unwrap(), MAX_NUM_LOGINS);

        for big in [json!(limit + 1), json!(4_000_000_000u64), json!(1u64 << 40), json!("4000000000")] {
            let err = validate_num_logins(&big).unwrap_err();
            assert!(err.is_validation(), "input {big}");
            assert_eq!(err.to_string(), "num_logins must not exceed 10000");
        }
    }

    #[tokio::test]
    async fn start_run_enforces_the_limit() {
        let orch = Orchestrator::new(Arc::new(crate::tests::AlwaysOk), RunConfig::default());
        let err = orch.start_run(MAX_NUM_LOGINS + 1).err().unwrap();
        assert!(err.is_validation());
        assert!(orch.start_run(u32::MAX).err().unwrap().is_validation());
    }

    #[test]
    fn start_run_outside_runtime_is_an_orchestration_fault() {
        let orch = Orchestrator::new(
            Arc::new(crate::tests::AlwaysOk),
            RunConfig::default(),
        );
        let err = orch.start_run(2).err().unwrap();
        assert!(matches!(err, SwarmError::Orchestration(_)));
    }

    #[tokio::test]
    async fn zero_is_rejected_before_any_event() {
        let orch = Orchestrator::new(Arc::new(crate::tests::AlwaysOk), RunConfig::default());
        assert!(orch.start_run(0).err().unwrap().is_validation());
    }
}
