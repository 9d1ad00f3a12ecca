//! Core data types for loginswarm
//!
//! Result records, the run summary, and the event payloads streamed to an
//! observer. Field names here are the wire format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Ceiling on concurrently running probes, whatever the requested run size.
pub const DEFAULT_WORKER_CAP: usize = 10;

/// Largest run a single request may ask for. Every result of a run is held
/// until the summary is built, so this bounds a run's memory.
pub const MAX_NUM_LOGINS: u32 = 10_000;

/// Tokens longer than this are cut for display.
pub const TOKEN_DISPLAY_LEN: usize = 20;

/// Failure messages are cut to this many characters.
pub const FAILURE_MESSAGE_LEN: usize = 100;

const ELLIPSIS: &str = "...";

/// One unit of requested work. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub id: u32,
}

impl ProbeRequest {
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Requests `1..=n`, in submission order. Produced lazily.
    pub fn batch(n: u32) -> impl ExactSizeIterator<Item = ProbeRequest> + Send {
        (0..n).map(|i| ProbeRequest::new(i + 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    Success,
    Failure,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeStatus::Success => "SUCCESS",
            ProbeStatus::Failure => "FAILURE",
        };
        f.pad(s)
    }
}

/// What a prober reports for an attempt that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub token: Option<String>,
    pub message: String,
}

impl ProbeOutcome {
    #[must_use]
    pub fn success(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            token: Some(token.into()),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            message: message.into(),
        }
    }
}

/// Result of one probe. Produced exactly once per `ProbeRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: u32,
    pub status: ProbeStatus,
    /// Display form of the session token; `None` unless `status` is SUCCESS.
    pub token: Option<String>,
    pub elapsed_seconds: f64,
    pub message: String,
}

impl ProbeResult {
    #[must_use]
    pub fn success(id: u32, token: Option<&str>, message: &str, elapsed: Duration) -> Self {
        Self {
            id,
            status: ProbeStatus::Success,
            token: Some(display_token(token.unwrap_or("N/A"))),
            elapsed_seconds: round_to(elapsed.as_secs_f64(), 2),
            message: message.trim().to_string(),
        }
    }

    #[must_use]
    pub fn failure(id: u32, message: &str, elapsed: Duration) -> Self {
        Self {
            id,
            status: ProbeStatus::Failure,
            token: None,
            elapsed_seconds: round_to(elapsed.as_secs_f64(), 2),
            message: truncate_chars(message.trim(), FAILURE_MESSAGE_LEN),
        }
    }

    /// Build the result for an attempt the prober completed.
    #[must_use]
    pub fn from_outcome(id: u32, outcome: &ProbeOutcome, elapsed: Duration) -> Self {
        if outcome.success {
            Self::success(id, outcome.token.as_deref(), &outcome.message, elapsed)
        } else {
            Self::failure(id, &outcome.message, elapsed)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ProbeStatus::Success)
    }
}

/// Aggregate over a finished run. `results` is ordered by id, not by completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_time: f64,
    pub success_count: usize,
    pub fail_count: usize,
    pub success_rate: f64,
    pub results: Vec<ProbeResult>,
}

impl RunSummary {
    /// `requested` is the run size the caller asked for and is the rate denominator.
    #[must_use]
    pub fn from_results(requested: u32, mut results: Vec<ProbeResult>, total: Duration) -> Self {
        results.sort_by_key(|r| r.id);
        let success_count = results.iter().filter(|r| r.is_success()).count();
        let fail_count = results.len() - success_count;
        let success_rate = if requested == 0 {
            0.0
        } else {
            round_to(success_count as f64 / f64::from(requested) * 100.0, 1)
        };

        Self {
            total_time: round_to(total.as_secs_f64(), 2),
            success_count,
            fail_count,
            success_rate,
            results,
        }
    }
}

/// Lifecycle events of a run, in the shape the observer receives them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    Start { num_logins: u32, timestamp: String },
    Progress { result: ProbeResult },
    Complete(RunSummary),
}

impl RunEvent {
    #[must_use]
    pub fn start(num_logins: u32) -> Self {
        RunEvent::Start {
            num_logins,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::Start { .. } => "start",
            RunEvent::Progress { .. } => "progress",
            RunEvent::Complete(_) => "complete",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Per-phase timeouts handed to every probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTimeouts {
    pub page_load: Duration,
    pub explicit_wait: Duration,
    pub implicit_wait: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(15),
            explicit_wait: Duration::from_secs(8),
            implicit_wait: Duration::from_secs(5),
        }
    }
}

impl ProbeTimeouts {
    /// Hard ceiling for a whole attempt: every phase at its limit.
    #[inline]
    #[must_use]
    pub fn task_deadline(&self) -> Duration {
        self.page_load + self.explicit_wait + self.implicit_wait
    }
}

/// Run tuning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub worker_cap: usize,
    pub timeouts: ProbeTimeouts,
    /// Capacity of the event channel between the run driver and the observer.
    pub event_buffer: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            worker_cap: DEFAULT_WORKER_CAP,
            timeouts: ProbeTimeouts::default(),
            event_buffer: 64,
        }
    }
}

impl RunConfig {
    #[inline]
    #[must_use]
    pub fn with_worker_cap(mut self, worker_cap: usize) -> Self {
        self.worker_cap = worker_cap;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Workers to run for `num_logins` probes: `min(num_logins, cap)`, never below 1.
    #[inline]
    #[must_use]
    pub fn max_concurrency(&self, num_logins: u32) -> usize {
        (num_logins as usize).min(self.worker_cap.max(1)).max(1)
    }
}

fn display_token(token: &str) -> String {
    if token.chars().count() > TOKEN_DISPLAY_LEN {
        let head: String = token.chars().take(TOKEN_DISPLAY_LEN).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        token.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
