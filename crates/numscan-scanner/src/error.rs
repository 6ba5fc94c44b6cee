use crate::pattern::PatternError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("pattern expands to {cardinality} candidates, above the limit of {limit}")]
    CandidateLimit { cardinality: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, ScanError>;
