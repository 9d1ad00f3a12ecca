// crates/orchestrator/src/pool.rs
//! Worker pool - fixed number of workers draining a shared task queue

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use loginswarm_common::ProbeResult;
use crate::task::ProbeTask;

/// Live counters for the tasks a pool is executing.
#[derive(Debug, Default)]
pub struct PoolStats {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl PoolStats {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of tasks that were ever in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Runs probe tasks on at most `max_concurrency` workers.
pub struct WorkerPool {
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Start the workers over `tasks`. Results come back through the returned
    /// stream in completion order.
    ///
    /// Tasks are pulled from the iterator one at a time as workers free up, so
    /// a lazy source never materializes more than `max_concurrency` of them.
    pub fn run<I>(&self, tasks: I) -> CompletionStream
    where
        I: IntoIterator<Item = ProbeTask>,
        I::IntoIter: ExactSizeIterator + Send + 'static,
    {
        let tasks = tasks.into_iter();
        let expected = tasks.len();
        let workers = self.max_concurrency.min(expected);
        let stats = Arc::new(PoolStats::default());
        let (tx, rx) = mpsc::channel(workers.max(1));

        // Shared queue pattern: every worker pulls the next task as soon as it is free.
        let queue = Arc::new(Mutex::new(tasks));

        info!("Worker pool starting tasks={} workers={}", expected, workers);

        for worker_id in 0..workers {
            let queue = queue.clone();
            let tx = tx.clone();
            let stats = stats.clone();

            tokio::spawn(async move {
                loop {
                    if tx.is_closed() {
                        debug!("Worker {} stopping: results are no longer consumed", worker_id);
                        break;
                    }

                    let maybe_task = {
                        let mut q = queue.lock().await;
                        q.next()
                    };

                    let task = match maybe_task {
                        Some(t) => t,
                        None => break, // queue empty, exit worker
                    };

                    stats.enter();
                    let result = task.execute().await;
                    stats.exit();

                    if tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }

        CompletionStream {
            rx,
            expected,
            received: 0,
            stats,
        }
    }
}

/// Completion-order view of a pool run. Yields exactly `expected` results.
pub struct CompletionStream {
    rx: mpsc::Receiver<ProbeResult>,
    expected: usize,
    received: usize,
    stats: Arc<PoolStats>,
}

impl CompletionStream {
    /// Next finished result, or `None` once every task has reported.
    pub async fn next(&mut self) -> Option<ProbeResult> {
        if self.received == self.expected {
            return None;
        }

        match self.rx.recv().await {
            Some(result) => {
                self.received += 1;
                Some(result)
            }
            None => {
                error!(
                    "Worker pool closed after {} of {} results",
                    self.received, self.expected
                );
                None
            }
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use loginswarm_common::{ProbeContext, ProbeOutcome, ProbeRequest, ProbeTimeouts, Prober};
    use std::time::Duration;

    /// Sleeps longer for lower ids so completion order inverts submission order.
    struct InvertedProber;

    #[async_trait]
    impl Prober for InvertedProber {
        async fn probe(&self, ctx: &ProbeContext) -> Result<ProbeOutcome> {
            tokio::time::sleep(Duration::from_millis(u64::from(10 - ctx.id) * 40)).await;
            Ok(ProbeOutcome::success("t", "ok"))
        }

        fn name(&self) -> &str {
            "inverted"
        }
    }

    struct QuickProber;

    #[async_trait]
    impl Prober for QuickProber {
        async fn probe(&self, _ctx: &ProbeContext) -> Result<ProbeOutcome> {
            Ok(ProbeOutcome::success("t", "ok"))
        }

        fn name(&self) -> &str {
            "quick"
        }
    }

    fn tasks(n: u32) -> impl ExactSizeIterator<Item = ProbeTask> + Send + 'static {
        let prober: Arc<dyn Prober> = Arc::new(InvertedProber);
        ProbeRequest::batch(n).map(move |r| ProbeTask::new(r, prober.clone(), ProbeTimeouts::default()))
    }

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let pool = WorkerPool::new(3);
        let mut stream = pool.run(tasks(3));

        let mut order = Vec::new();
        while let Some(r) = stream.next().await {
            order.push(r.id);
        }
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(stream.received(), 3);
    }

    #[tokio::test]
    async fn single_worker_preserves_submission_order() {
        let pool = WorkerPool::new(1);
        let mut stream = pool.run(tasks(4));

        let mut order = Vec::new();
        while let Some(r) = stream.next().await {
            order.push(r.id);
        }
        assert_eq!(order, vec![1, 2, 3, 4]);
        assert_eq!(stream.stats().peak(), 1);
    }

    #[tokio::test]
    async fn empty_run_is_exhausted_immediately() {
        let pool = WorkerPool::new(4);
        let mut stream = pool.run(Vec::<ProbeTask>::new());
        assert_eq!(stream.expected(), 0);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn tasks_are_pulled_only_as_workers_free_up() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let prober: Arc<dyn Prober> = Arc::new(QuickProber);
        let source = ProbeRequest::batch(1_000_000)
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .map(move |r| ProbeTask::new(r, prober.clone(), ProbeTimeouts::default()));

        let pool = WorkerPool::new(2);
        let mut stream = pool.run(source);
        assert_eq!(stream.expected(), 1_000_000);
        for _ in 0..3 {
            assert!(stream.next().await.is_some());
        }
        drop(stream);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let seen = pulled.load(Ordering::SeqCst);
        assert!(seen < 16, "pulled {seen} tasks for 3 consumed results");
    }
}
