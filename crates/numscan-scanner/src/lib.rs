//! numscan Scanner - Pattern expansion and concurrent directory lookups.
//!
//! This crate turns a compact phone-number pattern into candidate numbers
//! and checks each against a directory service through a pluggable
//! [`LookupClient`], collecting profile metadata for registered numbers.
//!
//! # Features
//!
//! - Lazy, deterministic expansion of `x` wildcards and `[...]` digit sets
//! - Fixed-size worker pool over one shared work queue
//! - Per-worker pacing with random jitter
//! - Best-effort enrichment (profile, business info, avatar)
//! - Cooperative cancellation and live progress counters
//!
//! # Example
//!
//! ```rust,ignore
//! use numscan_scanner::{prepare, ScanConfig, ScanOrchestrator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let pattern = prepare("+1 555 123 45xx", 1_000_000)?;
//! let orchestrator = ScanOrchestrator::new(Arc::new(client), ScanConfig::default());
//!
//! let mut scan = orchestrator.start(pattern, CancellationToken::new());
//! while let Some(outcome) = scan.next_outcome().await {
//!     println!("found {}", outcome.number);
//! }
//! let summary = scan.join().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod outcome;
pub mod pattern;
pub mod progress;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use lookup::{AvatarRef, BusinessInfo, LookupClient, LookupError, ProfileInfo, Registration};
pub use orchestrator::{ScanConfig, ScanHandle, ScanId, ScanOrchestrator, ScanSummary};
pub use outcome::ScanOutcome;
pub use pattern::{expand, normalize, Expansion, Pattern, PatternError};
pub use progress::ScanProgress;
pub use tokio_util::sync::CancellationToken;

/// Normalize user input, parse it, and refuse expansions above `max_candidates`.
pub fn prepare(input: &str, max_candidates: u64) -> Result<Pattern> {
    let pattern = Pattern::parse(&normalize(input))?;
    if pattern.cardinality() > max_candidates {
        return Err(ScanError::CandidateLimit {
            cardinality: pattern.cardinality(),
            limit: max_candidates,
        });
    }
    Ok(pattern)
}
