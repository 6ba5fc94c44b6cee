//! Shared types used across numscan.
//!
//! This module defines the phone-number newtype that flows from the pattern
//! expander through the scanner to the result sink, and the output formats
//! used when rendering a found number.

use crate::error::NumscanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fully-resolved phone number made of ASCII digits only.
///
/// Leading `+`, spaces and any service-specific suffix are never part of the
/// value; they are stripped before expansion or added at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new `PhoneNumber` from a string of digits.
    ///
    /// # Errors
    /// Returns error if the value is empty or contains anything but ASCII digits.
    pub fn new(digits: impl Into<String>) -> Result<Self, NumscanError> {
        let digits = digits.into();
        Self::validate(&digits)?;
        Ok(Self(digits))
    }

    /// Wrap a string the caller has already checked to be non-empty ASCII digits.
    #[must_use]
    pub fn from_digits_unchecked(digits: String) -> Self {
        debug_assert!(Self::validate(&digits).is_ok(), "not a digit string: {digits}");
        Self(digits)
    }

    /// Get the inner digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a `PhoneNumber` holds at least one digit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(digits: &str) -> Result<(), NumscanError> {
        if digits.is_empty() {
            return Err(NumscanError::Validation(
                "invalid phone number: empty".to_string(),
            ));
        }
        if let Some(ch) = digits.chars().find(|c| !c.is_ascii_digit()) {
            return Err(NumscanError::Validation(format!(
                "invalid phone number '{digits}': unexpected character '{ch}'"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = NumscanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

/// How a found number is rendered for display and for the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Click-to-chat link, `https://wa.me/<digits>`
    #[default]
    #[serde(rename = "wa.me")]
    WaMe,
    /// Service identifier, `<digits><suffix>`
    #[serde(rename = "jid")]
    Jid,
    /// Bare digits
    #[serde(rename = "pn")]
    Pn,
}

impl OutputFormat {
    /// All supported formats, in the order they are documented.
    pub const ALL: [OutputFormat; 3] = [Self::WaMe, Self::Jid, Self::Pn];

    /// Render a number in this format.
    #[must_use]
    pub fn render(self, number: &PhoneNumber, jid_suffix: &str) -> String {
        match self {
            Self::WaMe => format!("https://wa.me/{number}"),
            Self::Jid => format!("{number}{jid_suffix}"),
            Self::Pn => number.to_string(),
        }
    }

    /// Name used on the command line and in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaMe => "wa.me",
            Self::Jid => "jid",
            Self::Pn => "pn",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = NumscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| {
                NumscanError::Validation(format!(
                    "unknown output format '{s}' (expected wa.me, jid or pn)"
                ))
            })
    }
}
