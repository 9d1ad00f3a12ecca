// crates/orchestrator/src/publisher.rs
//! Event publisher - start / progress / complete over an ordered channel

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use loginswarm_common::{ProbeResult, RunEvent, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Started,
    Progress,
    Complete,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PublishError {
    #[error("cannot emit {event} while {state:?}")]
    InvalidTransition { event: &'static str, state: StreamState },

    #[error("observer disconnected")]
    ObserverGone,
}

/// Producer side of a run's event stream.
pub struct StreamPublisher {
    tx: Option<mpsc::Sender<RunEvent>>,
    state: StreamState,
    emitted: usize,
}

/// Observer side of a run's event stream. Ends after `complete`.
pub struct EventStream {
    rx: mpsc::Receiver<RunEvent>,
}

impl EventStream {
    pub async fn next(&mut self) -> Option<RunEvent> {
        self.rx.recv().await
    }

    pub fn into_inner(self) -> mpsc::Receiver<RunEvent> {
        self.rx
    }
}

impl StreamPublisher {
    pub fn channel(buffer: usize) -> (StreamPublisher, EventStream) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            StreamPublisher {
                tx: Some(tx),
                state: StreamState::Idle,
                emitted: 0,
            },
            EventStream { rx },
        )
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub async fn start(&mut self, num_logins: u32) -> Result<(), PublishError> {
        self.transition("start", &[StreamState::Idle], StreamState::Started)?;
        self.send(RunEvent::start(num_logins)).await
    }

    pub async fn progress(&mut self, result: ProbeResult) -> Result<(), PublishError> {
        self.transition(
            "progress",
            &[StreamState::Started, StreamState::Progress],
            StreamState::Progress,
        )?;
        self.send(RunEvent::Progress { result }).await
    }

    /// Emit the summary and close the stream.
    pub async fn complete(&mut self, summary: RunSummary) -> Result<(), PublishError> {
        self.transition(
            "complete",
            &[StreamState::Started, StreamState::Progress],
            StreamState::Complete,
        )?;
        let sent = self.send(RunEvent::Complete(summary)).await;
        self.tx = None;
        sent
    }

    fn transition(
        &mut self,
        event: &'static str,
        from: &[StreamState],
        to: StreamState,
    ) -> Result<(), PublishError> {
        if !from.contains(&self.state) {
            return Err(PublishError::InvalidTransition {
                event,
                state: self.state,
            });
        }
        self.state = to;
        Ok(())
    }

    async fn send(&mut self, event: RunEvent) -> Result<(), PublishError> {
        let tx = self.tx.as_ref().ok_or(PublishError::ObserverGone)?;
        let kind = event.kind();
        tx.send(event).await.map_err(|_| PublishError::ObserverGone)?;
        self.emitted += 1;
        debug!("Published {} event #{}", kind, self.emitted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary() -> RunSummary {
        RunSummary::from_results(
            1,
            vec![ProbeResult::success(1, Some("t"), "ok", Duration::ZERO)],
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn lifecycle_in_order_then_closed() {
        let (mut publisher, mut stream) = StreamPublisher::channel(8);
        publisher.start(1).await.unwrap();
        publisher
            .progress(ProbeResult::success(1, Some("t"), "ok", Duration::ZERO))
            .await
            .unwrap();
        publisher.complete(summary()).await.unwrap();
        assert_eq!(publisher.state(), StreamState::Complete);
        assert_eq!(publisher.emitted(), 3);

        let mut kinds = Vec::new();
        while let Some(event) = stream.next().await {
            kinds.push(event.kind());
        }
        assert_eq!(kinds, vec!["start", "progress", "complete"]);
    }

    #[tokio::test]
    async fn progress_before_start_is_rejected() {
        let (mut publisher, _stream) = StreamPublisher::channel(8);
        let err = publisher
            .progress(ProbeResult::failure(1, "x", Duration::ZERO))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PublishError::InvalidTransition {
                event: "progress",
                state: StreamState::Idle
            }
        );
    }

    #[tokio::test]
    async fn nothing_after_complete() {
        let (mut publisher, _stream) = StreamPublisher::channel(8);
        publisher.start(1).await.unwrap();
        publisher.complete(summary()).await.unwrap();

        assert!(publisher.start(1).await.is_err());
        assert!(publisher.complete(summary()).await.is_err());
        assert!(publisher
            .progress(ProbeResult::failure(1, "x", Duration::ZERO))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn dropped_observer_is_reported() {
        let (mut publisher, stream) = StreamPublisher::channel(8);
        drop(stream);
        assert_eq!(publisher.start(2).await, Err(PublishError::ObserverGone));
    }
}
