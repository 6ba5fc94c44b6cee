//! HTTP implementation of the lookup client.

use crate::error::{lookup_error, DirectoryError, Result};
use async_trait::async_trait;
use numscan_core::{DirectoryConfig, PhoneNumber};
use numscan_scanner::{
    AvatarRef, BusinessInfo, LookupClient, LookupError, ProfileInfo, Registration,
};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest error body carried into a [`LookupError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Directory service client over HTTP/JSON.
///
/// Cheap to share: one instance serves every scan worker.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl DirectoryClient {
    /// Create a client from directory settings.
    ///
    /// # Errors
    /// Returns error if the base URL is not http(s) or the HTTP client cannot be created.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DirectoryError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Base URL requests are sent to, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, resource: &str, number: &PhoneNumber) -> String {
        format!("{}/v1/{resource}/{number}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        number: &PhoneNumber,
    ) -> std::result::Result<T, LookupError> {
        let url = self.endpoint(resource, number);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        tracing::trace!("GET {}", url);
        let response = request.send().await.map_err(|e| lookup_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Directory returned {} for {}", status, url);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::Unavailable(format!("{resource} for {number}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body.trim().chars().take(MAX_ERROR_BODY).collect()
            };
            return Err(LookupError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LookupClient for DirectoryClient {
    async fn is_registered(
        &self,
        number: &PhoneNumber,
    ) -> std::result::Result<Registration, LookupError> {
        self.get_json("registrations", number).await
    }

    async fn profile(&self, number: &PhoneNumber) -> std::result::Result<ProfileInfo, LookupError> {
        self.get_json("profiles", number).await
    }

    async fn business_info(
        &self,
        number: &PhoneNumber,
    ) -> std::result::Result<BusinessInfo, LookupError> {
        self.get_json("business", number).await
    }

    async fn avatar(&self, number: &PhoneNumber) -> std::result::Result<AvatarRef, LookupError> {
        self.get_json("avatars", number).await
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
}
