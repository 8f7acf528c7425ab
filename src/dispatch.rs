//! Parallel dispatcher
//!
//! Runs one independent worker per partition. Every worker is spawned before
//! any is awaited (true fan-out), each worker resolves its target IDs through
//! the shared read-only index and runs the fetch-and-save operation per
//! target, and the coordinator returns only after every worker has
//! terminated. Workers share no mutable state; output artifacts are uniquely
//! named per target so concurrent writers never contend.
//!
//! Per-item fetches carry a deadline and a cooperative cancellation check,
//! so one hung remote call can neither stall its worker forever nor block
//! the coordinator's return once cancellation is requested.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, RetryConfig};
use crate::cutout::CutoutFetcher;
use crate::error::{Error, Result};
use crate::partition::round_robin;
use crate::retry::fetch_with_retry;
use crate::types::{Target, TargetId, TargetIndex};

/// Completion record of one worker
#[derive(Debug)]
pub struct WorkerOutcome {
    /// Index of the worker (position of its partition)
    pub worker: usize,
    /// Targets fetched successfully, with their artifact paths
    pub completed: Vec<(TargetId, PathBuf)>,
    /// Targets that failed, with the error that stopped them
    pub failed: Vec<(TargetId, Error)>,
    /// Targets never attempted because cancellation arrived first
    pub skipped: Vec<TargetId>,
}

impl WorkerOutcome {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            completed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Aggregate completion record of one dispatch
#[derive(Debug)]
pub struct DispatchReport {
    /// When the dispatch started
    pub started_at: DateTime<Utc>,
    /// Wall-clock time from fan-out to the last worker's termination
    pub elapsed: Duration,
    /// Per-worker outcomes, in partition order
    pub outcomes: Vec<WorkerOutcome>,
    /// Workers that terminated abnormally (panicked) instead of reporting
    pub join_failures: usize,
}

impl DispatchReport {
    /// Total targets fetched successfully
    pub fn completed(&self) -> usize {
        self.outcomes.iter().map(|o| o.completed.len()).sum()
    }

    /// Total targets that failed
    pub fn failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.failed.len()).sum()
    }

    /// Total targets skipped due to cancellation
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().map(|o| o.skipped.len()).sum()
    }

    /// Whether every target completed and every worker terminated normally
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0 && self.join_failures == 0
    }
}

/// Coordinator for parallel fetch-and-save over partitioned targets
#[derive(Clone, Debug)]
pub struct Dispatcher {
    item_timeout: Duration,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher from the library configuration
    pub fn new(config: &Config) -> Self {
        Self {
            item_timeout: config.fetch.item_timeout,
            retry: config.retry.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels the dispatch cooperatively
    ///
    /// Workers check it between items and while awaiting a fetch; items not
    /// yet attempted when it fires are reported as skipped.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Partition `ids` across `workers` and dispatch
    ///
    /// Convenience wrapper pairing [`round_robin`] with [`Dispatcher::run`].
    pub async fn run_targets(
        &self,
        ids: Vec<TargetId>,
        workers: usize,
        index: Arc<TargetIndex>,
        fetcher: Arc<dyn CutoutFetcher>,
        out_dir: PathBuf,
    ) -> Result<DispatchReport> {
        let partitions = round_robin(ids, workers)?;
        Ok(self.run(partitions, index, fetcher, out_dir).await)
    }

    /// Run one worker per partition and wait for all of them
    ///
    /// All workers are spawned before any is joined; the method returns only
    /// after every worker has terminated, normally or not. A worker with an
    /// empty partition completes immediately.
    pub async fn run(
        &self,
        partitions: Vec<Vec<TargetId>>,
        index: Arc<TargetIndex>,
        fetcher: Arc<dyn CutoutFetcher>,
        out_dir: PathBuf,
    ) -> DispatchReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = partitions.len();

        tracing::info!(
            workers,
            targets = partitions.iter().map(Vec::len).sum::<usize>(),
            "Dispatching fetch workers"
        );

        // Fan out: every worker starts before any is awaited
        let mut handles = Vec::with_capacity(workers);
        for (worker, partition) in partitions.into_iter().enumerate() {
            let ctx = WorkerContext {
                worker,
                partition,
                index: Arc::clone(&index),
                fetcher: Arc::clone(&fetcher),
                out_dir: out_dir.clone(),
                item_timeout: self.item_timeout,
                retry: self.retry.clone(),
                cancel: self.cancel.clone(),
            };
            handles.push(tokio::spawn(run_worker(ctx)));
        }

        // Join: block until every worker has terminated
        let mut outcomes = Vec::with_capacity(workers);
        let mut join_failures = 0;
        for (worker, joined) in futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
        {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(worker, error = %e, "Worker terminated abnormally");
                    join_failures += 1;
                    outcomes.push(WorkerOutcome::new(worker));
                }
            }
        }

        let report = DispatchReport {
            started_at,
            elapsed: start.elapsed(),
            outcomes,
            join_failures,
        };
        tracing::info!(
            elapsed_ms = report.elapsed.as_millis(),
            completed = report.completed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Dispatch finished"
        );
        report
    }
}

/// Everything one worker owns for the duration of its run
struct WorkerContext {
    worker: usize,
    partition: Vec<TargetId>,
    index: Arc<TargetIndex>,
    fetcher: Arc<dyn CutoutFetcher>,
    out_dir: PathBuf,
    item_timeout: Duration,
    retry: RetryConfig,
    cancel: CancellationToken,
}

/// Process one partition to completion
///
/// A per-item failure is recorded and the worker moves on to its next item;
/// only cancellation stops a worker early.
async fn run_worker(ctx: WorkerContext) -> WorkerOutcome {
    let WorkerContext {
        worker,
        partition,
        index,
        fetcher,
        out_dir,
        item_timeout,
        retry,
        cancel,
    } = ctx;

    let mut outcome = WorkerOutcome::new(worker);
    tracing::debug!(worker, targets = partition.len(), "Worker started");

    let mut items = partition.into_iter();
    while let Some(id) = items.next() {
        if cancel.is_cancelled() {
            outcome.skipped.push(id);
            outcome.skipped.extend(items);
            break;
        }

        let target = match index.get(id) {
            Some(target) => *target,
            None => {
                outcome.failed.push((
                    id,
                    Error::InvalidInput(format!("target {id} is not in the shared index")),
                ));
                continue;
            }
        };

        match fetch_one(&fetcher, target, &out_dir, item_timeout, &retry, &cancel).await {
            Ok(path) => outcome.completed.push((id, path)),
            Err(Error::Cancelled { .. }) => {
                outcome.skipped.push(id);
                outcome.skipped.extend(items);
                break;
            }
            Err(e) => {
                tracing::warn!(worker, target = %id, error = %e, "Target failed");
                outcome.failed.push((id, e));
            }
        }
    }

    tracing::debug!(
        worker,
        completed = outcome.completed.len(),
        failed = outcome.failed.len(),
        skipped = outcome.skipped.len(),
        "Worker finished"
    );
    outcome
}

/// Fetch one target with retry, a per-item deadline, and cancellation
async fn fetch_one(
    fetcher: &Arc<dyn CutoutFetcher>,
    target: Target,
    out_dir: &std::path::Path,
    item_timeout: Duration,
    retry: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    fetch_with_retry(retry, || {
        let fetcher = Arc::clone(fetcher);
        let out_dir = out_dir.to_path_buf();
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(Error::Cancelled {
                    target: target.id.get(),
                }),
                attempt = tokio::time::timeout(
                    item_timeout,
                    fetcher.fetch_and_save(&target, &out_dir),
                ) => match attempt {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        target: target.id.get(),
                        deadline_secs: item_timeout.as_secs(),
                    }),
                },
            }
        }
    })
    .await
}
