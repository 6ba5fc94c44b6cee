//! numscan Directory - HTTP/JSON directory lookup client.
//!
//! Implements [`numscan_scanner::LookupClient`] against a directory service
//! exposing one read-only resource per lookup kind:
//!
//! | Call | Request |
//! |---|---|
//! | registration | `GET {base}/v1/registrations/{number}` |
//! | profile | `GET {base}/v1/profiles/{number}` |
//! | business info | `GET {base}/v1/business/{number}` |
//! | avatar | `GET {base}/v1/avatars/{number}` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod error;

pub use client::DirectoryClient;
pub use error::{DirectoryError, Result};
