use async_trait::async_trait;
use futures::StreamExt;
use numscan_core::PhoneNumber;
use numscan_scanner::{
    AvatarRef, BusinessInfo, CancellationToken, LookupClient, LookupError, Pattern, ProfileInfo,
    Registration, ScanConfig, ScanOrchestrator,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// In-memory directory: numbers ending in `7` are registered.
#[derive(Default)]
struct FakeDirectory {
    checks: Mutex<HashMap<String, usize>>,
    call_times: Mutex<Vec<Instant>>,
    calls: AtomicUsize,
    fail_business: bool,
    fail_lookup_for: Option<String>,
    cancel_after: Option<(usize, CancellationToken)>,
    lookup_delay: Option<Duration>,
}

impl FakeDirectory {
    fn checks(&self) -> HashMap<String, usize> {
        self.checks.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl LookupClient for FakeDirectory {
    async fn is_registered(&self, number: &PhoneNumber) -> Result<Registration, LookupError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.call_times
            .lock()
            .expect("lock poisoned")
            .push(Instant::now());
        *self
            .checks
            .lock()
            .expect("lock poisoned")
            .entry(number.to_string())
            .or_default() += 1;

        if let Some((limit, token)) = &self.cancel_after {
            if call >= *limit {
                token.cancel();
            }
        }
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookup_for.as_deref() == Some(number.as_str()) {
            return Err(LookupError::Transport("connection reset".to_string()));
        }

        Ok(Registration {
            registered: number.as_str().ends_with('7'),
            verified_name: None,
        })
    }

    async fn profile(&self, number: &PhoneNumber) -> Result<ProfileInfo, LookupError> {
        Ok(ProfileInfo {
            status: Some(format!("status of {number}")),
            display_name: Some(format!("User {number}")),
            verified_name: None,
        })
    }

    async fn business_info(&self, _number: &PhoneNumber) -> Result<BusinessInfo, LookupError> {
        if self.fail_business {
            return Err(LookupError::Status {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(BusinessInfo {
            email: Some("shop@example.com".to_string()),
            ..BusinessInfo::default()
        })
    }

    async fn avatar(&self, number: &PhoneNumber) -> Result<AvatarRef, LookupError> {
        Err(LookupError::Unavailable(format!("no picture for {number}")))
    }
}

fn fast_config(concurrency: usize) -> ScanConfig {
    ScanConfig::default()
        .with_concurrency(concurrency)
        .with_pacing(Duration::ZERO, Duration::ZERO)
}

fn pattern(text: &str) -> Pattern {
    Pattern::parse(text).expect("valid pattern")
}

#[tokio::test]
async fn test_every_candidate_processed_exactly_once() {
    for concurrency in [1, 3, 8, 64] {
        let directory = Arc::new(FakeDirectory::default());
        let orchestrator = ScanOrchestrator::new(directory.clone(), fast_config(concurrency));

        let mut scan = orchestrator.start(pattern("12xx"), CancellationToken::new());
        let mut found = Vec::new();
        while let Some(outcome) = scan.next_outcome().await {
            found.push(outcome.number.to_string());
        }
        let summary = scan.join().await;

        let checks = directory.checks();
        assert_eq!(checks.len(), 100, "concurrency {concurrency}");
        assert!(checks.values().all(|&n| n == 1), "concurrency {concurrency}");

        found.sort();
        let expected: Vec<String> = (0..10).map(|d| format!("12{d}7")).collect();
        assert_eq!(found, expected);

        assert_eq!(summary.total, Some(100));
        assert_eq!(summary.processed, 100);
        assert_eq!(summary.found, 10);
        assert!(!summary.cancelled);
    }
}

#[tokio::test(start_paused = true)]
async fn test_delay_applies_per_worker_before_each_lookup() {
    let delay = Duration::from_millis(100);
    let directory = Arc::new(FakeDirectory::default());
    let config = ScanConfig::default()
        .with_concurrency(3)
        .with_pacing(delay, Duration::ZERO);
    let orchestrator = ScanOrchestrator::new(directory.clone(), config);

    let started = Instant::now();
    let mut scan = orchestrator.start(pattern("1x"), CancellationToken::new());
    while scan.next_outcome().await.is_some() {}
    let summary = scan.join().await;
    let elapsed = started.elapsed();

    assert_eq!(summary.processed, 10);

    // 10 candidates over 3 workers: the busiest worker paces 4 times
    assert!(elapsed >= delay * 4, "finished after {elapsed:?}");
    // one global delay per lookup would take 10 delays
    assert!(elapsed < delay * 10, "finished after {elapsed:?}");

    let times = directory.call_times.lock().expect("lock poisoned").clone();
    assert_eq!(times.len(), 10);
    let first = times.iter().min().copied().expect("at least one lookup");
    assert!(first - started >= delay, "first lookup after {:?}", first - started);
}

#[tokio::test]
async fn test_outcomes_are_enriched() {
    let directory = Arc::new(FakeDirectory::default());
    let orchestrator = ScanOrchestrator::new(directory, fast_config(2));

    let mut scan = orchestrator.start(pattern("15557"), CancellationToken::new());
    let outcomes: Vec<_> = scan.outcomes().collect().await;
    assert_eq!(outcomes.len(), 1);

    let outcome = &outcomes[0];
    assert!(outcome.registered);
    assert_eq!(outcome.display_name.as_deref(), Some("User 15557"));
    assert_eq!(outcome.status.as_deref(), Some("status of 15557"));
    assert_eq!(
        outcome.business.as_ref().and_then(|b| b.email.as_deref()),
        Some("shop@example.com")
    );
    // avatar lookup failed, field stays unset
    assert!(outcome.avatar_url.is_none());
}

#[tokio::test]
async fn test_business_failure_keeps_outcome() {
    let directory = Arc::new(FakeDirectory {
        fail_business: true,
        ..FakeDirectory::default()
    });
    let orchestrator = ScanOrchestrator::new(directory, fast_config(1));

    let mut scan = orchestrator.start(pattern("4[17]"), CancellationToken::new());
    let outcome = scan.next_outcome().await.expect("one registered number");
    assert!(scan.next_outcome().await.is_none());

    assert_eq!(outcome.number.as_str(), "47");
    assert!(outcome.registered);
    assert!(outcome.business.is_none());
    assert_eq!(outcome.display_name.as_deref(), Some("User 47"));
}

#[tokio::test]
async fn test_lookup_error_produces_no_outcome() {
    let directory = Arc::new(FakeDirectory {
        fail_lookup_for: Some("17".to_string()),
        ..FakeDirectory::default()
    });
    let orchestrator = ScanOrchestrator::new(directory.clone(), fast_config(2));

    let mut scan = orchestrator.start(pattern("[12]7"), CancellationToken::new());
    let found: Vec<String> = scan
        .outcomes()
        .map(|outcome| outcome.number.to_string())
        .collect()
        .await;
    let summary = scan.join().await;

    assert_eq!(found, vec!["27".to_string()]);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.found, 1);
    assert_eq!(directory.checks().len(), 2);
}

#[tokio::test]
async fn test_cancelled_before_start_dispatches_nothing() {
    let directory = Arc::new(FakeDirectory::default());
    let orchestrator = ScanOrchestrator::new(directory.clone(), fast_config(4));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut scan = orchestrator.start(pattern("1xx"), cancel);

    assert!(scan.next_outcome().await.is_none());
    let summary = scan.join().await;
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellation_stops_new_dispatch() {
    let cancel = CancellationToken::new();
    let directory = Arc::new(FakeDirectory {
        cancel_after: Some((3, cancel.clone())),
        ..FakeDirectory::default()
    });
    let orchestrator = ScanOrchestrator::new(directory.clone(), fast_config(1));

    // 1000 candidates; the third lookup trips the signal
    let mut scan = orchestrator.start(pattern("xx7x"), cancel);
    let outcomes: Vec<_> = scan.outcomes().collect().await;
    let summary = scan.join().await;

    assert!(summary.cancelled);
    assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.processed, 3);
    // "0070" .. "0072": the in-flight third lookup still completes, none registered
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn test_cancellation_during_delay() {
    let directory = Arc::new(FakeDirectory::default());
    let config = fast_config(2).with_pacing(Duration::from_secs(30), Duration::ZERO);
    let orchestrator = ScanOrchestrator::new(directory.clone(), config);

    let cancel = CancellationToken::new();
    let mut scan = orchestrator.start(pattern("1x"), cancel.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let drained = tokio::time::timeout(Duration::from_secs(5), scan.next_outcome()).await;
    assert_eq!(drained.ok(), Some(None));
    let summary = scan.join().await;
    assert!(summary.cancelled);
    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_timeout_drops_candidate() {
    let directory = Arc::new(FakeDirectory {
        lookup_delay: Some(Duration::from_secs(10)),
        ..FakeDirectory::default()
    });
    let config = fast_config(2).with_lookup_timeout(Some(Duration::from_millis(20)));
    let orchestrator = ScanOrchestrator::new(directory, config);

    let mut scan = orchestrator.start(pattern("[17]7"), CancellationToken::new());
    let outcomes = tokio::time::timeout(Duration::from_secs(5), scan.outcomes().collect::<Vec<_>>())
        .await
        .expect("timed-out lookups must not stall the scan");
    let summary = scan.join().await;

    assert!(outcomes.is_empty());
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.found, 0);
}

#[tokio::test]
async fn test_progress_tracks_processed_candidates() {
    let directory = Arc::new(FakeDirectory::default());
    let orchestrator = ScanOrchestrator::new(directory, fast_config(4));

    let mut scan = orchestrator.start(pattern("9x"), CancellationToken::new());
    let progress = scan.progress();
    assert_eq!(progress.total(), Some(10));

    while scan.next_outcome().await.is_some() {}
    assert_eq!(progress.processed(), 10);
    assert_eq!(progress.percent_complete(), Some(100.0));
    assert_eq!(progress.found(), 1);
}

#[tokio::test]
async fn test_unknown_total_from_unsized_source() {
    let directory = Arc::new(FakeDirectory::default());
    let orchestrator = ScanOrchestrator::new(directory, fast_config(2));

    let numbers = pattern("3x")
        .into_iter()
        .filter(|n| n.as_str() != "30");
    let mut scan = orchestrator.start(numbers, CancellationToken::new());
    assert_eq!(scan.progress().total(), None);

    let summary = {
        while scan.next_outcome().await.is_some() {}
        scan.join().await
    };
    assert_eq!(summary.processed, 9);
    assert_eq!(summary.found, 1);
}
