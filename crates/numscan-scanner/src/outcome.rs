//! Records produced for registered numbers.

use crate::lookup::{AvatarRef, BusinessInfo, ProfileInfo, Registration};
use chrono::{DateTime, Utc};
use numscan_core::PhoneNumber;
use serde::{Deserialize, Serialize};

/// Everything learned about one registered number.
///
/// Built once by a worker and handed off through the result stream; the
/// receiver owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// The number that was looked up
    pub number: PhoneNumber,
    /// Always true for outcomes on the result stream
    pub registered: bool,
    /// Display name from the public profile
    pub display_name: Option<String>,
    /// Verified business name
    pub verified_name: Option<String>,
    /// Status / about text
    pub status: Option<String>,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    /// Business profile, when the number has one
    pub business: Option<BusinessInfo>,
    /// When the registration was confirmed
    pub found_at: DateTime<Utc>,
}

impl ScanOutcome {
    /// Outcome for a confirmed registration with no enrichment yet.
    #[must_use]
    pub fn registered(number: PhoneNumber, registration: Registration) -> Self {
        Self {
            number,
            registered: registration.registered,
            display_name: None,
            verified_name: registration.verified_name,
            status: None,
            avatar_url: None,
            business: None,
            found_at: Utc::now(),
        }
    }

    /// Merge public profile fields. A verified name from the registration
    /// answer takes precedence.
    pub(crate) fn apply_profile(&mut self, profile: ProfileInfo) {
        self.status = profile.status.filter(|s| !s.is_empty());
        self.display_name = profile.display_name.filter(|s| !s.is_empty());
        if self.verified_name.is_none() {
            self.verified_name = profile.verified_name.filter(|s| !s.is_empty());
        }
    }

    /// Attach the business profile unless it is empty.
    pub(crate) fn apply_business(&mut self, business: BusinessInfo) {
        if !business.is_empty() {
            self.business = Some(business);
        }
    }

    /// Attach the profile picture reference.
    pub(crate) fn apply_avatar(&mut self, avatar: AvatarRef) {
        if !avatar.url.is_empty() {
            self.avatar_url = Some(avatar.url);
        }
    }
}
