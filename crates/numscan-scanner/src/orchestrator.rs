//! Scan orchestrator for checking candidate numbers against a directory.
//!
//! This module provides the `ScanOrchestrator`, which runs a fixed pool of
//! workers over one shared work queue, paces every lookup, enriches hits
//! and streams the resulting outcomes back to a single consumer.

use crate::lookup::{LookupClient, LookupError};
use crate::outcome::ScanOutcome;
use crate::progress::ScanProgress;
use futures::stream::Stream;
use numscan_core::{PhoneNumber, ScanningConfig};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default capacity of the work queue between feeder and workers.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default capacity of the result stream.
const DEFAULT_RESULT_BUFFER: usize = 64;

/// Identifier attached to one scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(uuid::Uuid);

impl ScanId {
    /// Create a new random `ScanId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Worker pool and pacing parameters for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Number of parallel workers, at least 1
    pub concurrency: usize,
    /// Delay before each lookup, per worker
    pub delay: Duration,
    /// Upper bound of the random jitter added to `delay`
    pub jitter: Duration,
    /// Limit for each individual lookup call
    pub lookup_timeout: Option<Duration>,
    /// Candidates buffered ahead of the workers
    pub queue_capacity: usize,
    /// Outcomes buffered ahead of the consumer
    pub result_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&ScanningConfig::default())
    }
}

impl From<&ScanningConfig> for ScanConfig {
    fn from(settings: &ScanningConfig) -> Self {
        Self {
            concurrency: settings.concurrency.max(1),
            delay: Duration::from_millis(settings.delay_ms),
            jitter: Duration::from_millis(settings.jitter_ms),
            lookup_timeout: (settings.lookup_timeout_secs > 0)
                .then(|| Duration::from_secs(settings.lookup_timeout_secs)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            result_buffer: DEFAULT_RESULT_BUFFER,
        }
    }
}

impl ScanConfig {
    /// Set the worker count. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the fixed per-worker delay and jitter bound.
    #[must_use]
    pub fn with_pacing(mut self, delay: Duration, jitter: Duration) -> Self {
        self.delay = delay;
        self.jitter = jitter;
        self
    }

    /// Set or clear the per-lookup timeout.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

/// Final counters of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    /// Scan identifier
    pub scan_id: ScanId,
    /// Candidates the scan was started with, when known
    pub total: Option<u64>,
    /// Candidates a lookup was attempted for
    pub processed: u64,
    /// Outcomes emitted
    pub found: u64,
    /// Whether the scan was stopped by cancellation
    pub cancelled: bool,
    /// Wall-clock time from start to join
    pub elapsed: Duration,
}

/// Orchestrates lookups for a sequence of candidate numbers.
pub struct ScanOrchestrator {
    /// Directory client shared by all workers
    lookup: Arc<dyn LookupClient>,
    /// Pool and pacing parameters
    config: ScanConfig,
}

impl ScanOrchestrator {
    /// Create a new scan orchestrator.
    #[must_use]
    pub fn new(lookup: Arc<dyn LookupClient>, config: ScanConfig) -> Self {
        let config = ScanConfig {
            concurrency: config.concurrency.max(1),
            queue_capacity: config.queue_capacity.max(1),
            result_buffer: config.result_buffer.max(1),
            ..config
        };
        Self { lookup, config }
    }

    /// Start scanning `candidates` in the background.
    ///
    /// Candidates are pulled lazily as workers free up. Outcomes arrive on
    /// the returned handle in completion order, not candidate order. The
    /// stream ends once every worker has exited.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<I>(&self, candidates: I, cancel: CancellationToken) -> ScanHandle
    where
        I: IntoIterator<Item = PhoneNumber>,
        I::IntoIter: Send + 'static,
    {
        let candidates = candidates.into_iter();
        let total = match candidates.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower as u64),
            _ => None,
        };

        let scan_id = ScanId::generate();
        let progress = Arc::new(ScanProgress::new(total));
        let (queue_tx, queue_rx) = async_channel::bounded(self.config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(self.config.result_buffer);
        let span = tracing::info_span!("scan", scan_id = %scan_id);

        tracing::info!(
            parent: &span,
            "Starting scan with {} workers ({} candidates)",
            self.config.concurrency,
            total.map_or_else(|| "unknown".to_string(), |t| t.to_string())
        );

        let mut tasks = JoinSet::new();
        tasks.spawn(feed(candidates, queue_tx, cancel.clone()).instrument(span.clone()));

        for worker_id in 0..self.config.concurrency {
            let worker = Worker {
                id: worker_id,
                lookup: Arc::clone(&self.lookup),
                config: self.config.clone(),
                queue: queue_rx.clone(),
                results: result_tx.clone(),
                progress: Arc::clone(&progress),
                cancel: cancel.clone(),
            };
            tasks.spawn(worker.run().instrument(span.clone()));
        }

        ScanHandle {
            scan_id,
            progress,
            outcomes: result_rx,
            tasks,
            cancel,
            started: Instant::now(),
        }
    }
}

/// A running scan.
///
/// Dropping the handle aborts all workers.
pub struct ScanHandle {
    scan_id: ScanId,
    progress: Arc<ScanProgress>,
    outcomes: mpsc::Receiver<ScanOutcome>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    started: Instant,
}

impl ScanHandle {
    /// Identifier of this scan.
    #[must_use]
    pub fn scan_id(&self) -> ScanId {
        self.scan_id
    }

    /// Live counters, shareable with a progress display.
    #[must_use]
    pub fn progress(&self) -> Arc<ScanProgress> {
        Arc::clone(&self.progress)
    }

    /// Stop dispatching new candidates. In-flight lookups still complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next outcome, or `None` once all workers have exited.
    pub async fn next_outcome(&mut self) -> Option<ScanOutcome> {
        self.outcomes.recv().await
    }

    /// The result stream as a [`Stream`]. Single pass; ends with the scan.
    pub fn outcomes(&mut self) -> impl Stream<Item = ScanOutcome> + '_ {
        futures::stream::poll_fn(move |cx| self.outcomes.poll_recv(cx))
    }

    /// Wait for every worker to exit and return the final counters.
    ///
    /// Outcomes not yet taken from the stream are discarded.
    pub async fn join(mut self) -> ScanSummary {
        self.outcomes.close();
        while self.outcomes.recv().await.is_some() {}

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Scan {} task failed: {}", self.scan_id, e);
            }
        }

        let summary = ScanSummary {
            scan_id: self.scan_id,
            total: self.progress.total(),
            processed: self.progress.processed(),
            found: self.progress.found(),
            cancelled: self.cancel.is_cancelled(),
            elapsed: self.started.elapsed(),
        };
        tracing::info!(
            "Scan {} finished: {} processed, {} found{}",
            summary.scan_id,
            summary.processed,
            summary.found,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }
}

/// Push candidates onto the work queue until exhausted or cancelled.
async fn feed<I>(candidates: I, queue: async_channel::Sender<PhoneNumber>, cancel: CancellationToken)
where
    I: Iterator<Item = PhoneNumber>,
{
    for number in candidates {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Feeder stopped by cancellation");
                break;
            }
            sent = queue.send(number) => {
                if sent.is_err() {
                    // every worker is gone
                    break;
                }
            }
        }
    }
}

struct Worker {
    id: usize,
    lookup: Arc<dyn LookupClient>,
    config: ScanConfig,
    queue: async_channel::Receiver<PhoneNumber>,
    results: mpsc::Sender<ScanOutcome>,
    progress: Arc<ScanProgress>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let number = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                next = self.queue.recv() => match next {
                    Ok(number) => number,
                    Err(_) => break,
                },
            };

            if !self.pace().await || self.cancel.is_cancelled() {
                break;
            }

            let processed = self.progress.record_processed();
            tracing::trace!("Worker {} checking {} (#{})", self.id, number, processed);

            if let Some(outcome) = self.check(&number).await {
                if self.results.send(outcome).await.is_err() {
                    tracing::debug!("Result stream closed, worker {} exiting", self.id);
                    break;
                }
                self.progress.record_found();
            }
        }
        tracing::debug!("Worker {} exited", self.id);
    }

    /// Sleep for the configured delay plus jitter. False if cancelled meanwhile.
    async fn pace(&self) -> bool {
        let delay = self.config.delay + jitter(self.config.jitter);
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    /// Look up one number. Misses and errors yield `None`; enrichment
    /// failures only leave fields unset.
    async fn check(&self, number: &PhoneNumber) -> Option<ScanOutcome> {
        let registration = match self.limited(self.lookup.is_registered(number)).await {
            Ok(registration) => registration,
            Err(LookupError::RateLimited { retry_after }) => {
                tracing::warn!("Rate limited while checking {} (retry after {:?})", number, retry_after);
                return None;
            }
            Err(e) => {
                tracing::debug!("Lookup failed for {}: {}", number, e);
                return None;
            }
        };

        if !registration.registered {
            return None;
        }

        let mut outcome = ScanOutcome::registered(number.clone(), registration);
        let (profile, business, avatar) = tokio::join!(
            self.limited(self.lookup.profile(number)),
            self.limited(self.lookup.business_info(number)),
            self.limited(self.lookup.avatar(number)),
        );

        match profile {
            Ok(profile) => outcome.apply_profile(profile),
            Err(e) => tracing::debug!("Profile lookup failed for {}: {}", number, e),
        }
        match business {
            Ok(business) => outcome.apply_business(business),
            Err(e) => tracing::debug!("Business lookup failed for {}: {}", number, e),
        }
        match avatar {
            Ok(avatar) => outcome.apply_avatar(avatar),
            Err(e) => tracing::debug!("Avatar lookup failed for {}: {}", number, e),
        }

        Some(outcome)
    }

    async fn limited<T, F>(&self, call: F) -> Result<T, LookupError>
    where
        F: Future<Output = Result<T, LookupError>>,
    {
        match self.config.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| LookupError::Timeout(limit))?,
            None => call.await,
        }
    }
}

/// Random extra delay in `[0, max]`, millisecond granularity.
fn jitter(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
