// crates/orchestrator/src/task.rs
//! Probe task - one login attempt, timed, isolated and infallible

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use loginswarm_common::{ProbeContext, ProbeRequest, ProbeResult, ProbeTimeouts, Prober};

/// Scratch directory owned by a single attempt.
///
/// Named with a fresh v4 UUID so concurrent attempts never share browser
/// profiles, cookie jars or downloads. Dropping it removes the directory,
/// which covers the cancellation path; `close` is the normal release.
pub struct ProbeSession {
    key: Uuid,
    dir: TempDir,
}

/// How releasing a session went. Never feeds back into the probe result.
#[derive(Debug)]
pub enum CleanupOutcome {
    Released,
    Failed(std::io::Error),
}

impl ProbeSession {
    pub fn acquire() -> std::io::Result<Self> {
        let key = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("loginswarm-{key}-"))
            .tempdir()?;
        Ok(Self { key, dir })
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn close(self) -> CleanupOutcome {
        match self.dir.close() {
            Ok(()) => CleanupOutcome::Released,
            Err(e) => CleanupOutcome::Failed(e),
        }
    }
}

/// One schedulable login attempt.
pub struct ProbeTask {
    request: ProbeRequest,
    prober: Arc<dyn Prober>,
    timeouts: ProbeTimeouts,
}

impl ProbeTask {
    pub fn new(request: ProbeRequest, prober: Arc<dyn Prober>, timeouts: ProbeTimeouts) -> Self {
        Self {
            request,
            prober,
            timeouts,
        }
    }

    pub fn id(&self) -> u32 {
        self.request.id
    }

    /// Run the attempt. Every fault ends up as a FAILURE result; nothing escapes.
    #[instrument(skip(self), fields(id = self.request.id))]
    pub async fn execute(self) -> ProbeResult {
        let id = self.request.id;
        let start = Instant::now();

        let session = match ProbeSession::acquire() {
            Ok(s) => s,
            Err(e) => {
                warn!("Probe {} could not allocate a session: {}", id, e);
                return ProbeResult::failure(id, &format!("session setup failed: {e}"), start.elapsed());
            }
        };
        debug!("Probe {} using session {}", id, session.key());

        let ctx = ProbeContext::new(id, session.path().to_path_buf(), self.timeouts);
        let deadline = self.timeouts.task_deadline();
        let prober = self.prober.clone();

        // Own task so a panicking prober is reported through the JoinHandle
        let handle = tokio::spawn(async move {
            tokio::time::timeout(deadline, prober.probe(&ctx)).await
        });

        let verdict = match handle.await {
            Ok(Ok(Ok(outcome))) => Ok(outcome),
            Ok(Ok(Err(e))) => Err(format!("{e:#}")),
            Ok(Err(_)) => Err(format!("probe timed out after {}s", deadline.as_secs())),
            Err(e) if e.is_panic() => Err("probe panicked".to_string()),
            Err(e) => Err(format!("probe aborted: {e}")),
        };

        if let CleanupOutcome::Failed(e) = session.close() {
            warn!("Probe {} session cleanup failed: {}", id, e);
        }

        let elapsed = start.elapsed();
        let result = match verdict {
            Ok(outcome) => ProbeResult::from_outcome(id, &outcome, elapsed),
            Err(message) => ProbeResult::failure(id, &message, elapsed),
        };

        if result.is_success() {
            debug!(
                "Probe {} succeeded in {:.2}s token={}",
                id,
                result.elapsed_seconds,
                result.token.as_deref().unwrap_or("N/A")
            );
        } else {
            warn!("Probe {} failed: {}", id, result.message);
        }
        result
    }
}
