//! Directory lookup interface.
//!
//! The scanner never talks to a directory service directly. It drives an
//! implementation of [`LookupClient`]; every call is an independent,
//! idempotent read for one number.

use async_trait::async_trait;
use numscan_core::PhoneNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single lookup call.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Connection, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with an unexpected status
    #[error("directory returned status {status}: {message}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Service asked us to slow down
    #[error("rate limited by directory service")]
    RateLimited {
        /// Server-suggested wait, if any
        retry_after: Option<Duration>,
    },

    /// Response could not be decoded
    #[error("failed to decode directory response: {0}")]
    Decode(String),

    /// Call exceeded the configured lookup timeout
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Requested information does not exist for this number
    #[error("not available: {0}")]
    Unavailable(String),
}

/// Answer to "is this number registered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Whether the number has an account
    pub registered: bool,
    /// Verified business name reported alongside the registration
    #[serde(default)]
    pub verified_name: Option<String>,
}

/// Public profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInfo {
    /// Status / about text
    pub status: Option<String>,
    /// Display name
    pub display_name: Option<String>,
    /// Verified business name
    pub verified_name: Option<String>,
}

/// Business profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    /// Contact e-mail
    pub email: Option<String>,
    /// Website
    pub website: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Any other fields the service returns, kept as sent
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BusinessInfo {
    /// True when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.website.is_none() && self.address.is_none()
            && self.extra.values().all(Value::is_null)
    }
}

/// Where the profile picture can be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRef {
    /// Picture URL
    pub url: String,
}

/// Client for a remote directory service.
///
/// Implementations must be thread-safe (Send + Sync); the scanner shares one
/// client across all workers.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Whether `number` is registered.
    async fn is_registered(&self, number: &PhoneNumber) -> Result<Registration, LookupError>;

    /// Public profile of a registered number.
    async fn profile(&self, number: &PhoneNumber) -> Result<ProfileInfo, LookupError>;

    /// Business profile of a registered number.
    async fn business_info(&self, number: &PhoneNumber) -> Result<BusinessInfo, LookupError>;

    /// Profile picture reference of a registered number.
    async fn avatar(&self, number: &PhoneNumber) -> Result<AvatarRef, LookupError>;
}
