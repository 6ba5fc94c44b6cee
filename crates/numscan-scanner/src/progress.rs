//! Shared scan counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every worker of one scan.
///
/// Totals are monotonic; they say nothing about which worker handled which
/// number.
#[derive(Debug, Default)]
pub struct ScanProgress {
    total: Option<u64>,
    processed: AtomicU64,
    found: AtomicU64,
}

impl ScanProgress {
    /// Counters for a scan of `total` candidates, when known.
    #[must_use]
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Number of candidates the scan was started with.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Candidates a lookup was attempted for, hit or miss.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Outcomes pushed onto the result stream.
    #[must_use]
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }

    /// Percentage of candidates processed, `None` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.processed() as f64 / total as f64 * 100.0),
            None => None,
        }
    }

    /// Record one attempted candidate and return the new processed total.
    pub(crate) fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_found(&self) {
        self.found.fetch_add(1, Ordering::Relaxed);
    }
}
