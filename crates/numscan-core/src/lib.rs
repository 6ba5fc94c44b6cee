//! numscan Core - Foundation crate for the numscan phone-number scanner.
//!
//! This crate provides shared types, error handling and configuration
//! management that the scanner, directory client and CLI depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and enums (`PhoneNumber`, `OutputFormat`)
//!
//! # Example
//!
//! ```rust
//! use numscan_core::{AppConfig, OutputFormat, PhoneNumber};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.scanning.concurrency, 1);
//!
//! let number = PhoneNumber::new("15551234567")?;
//! assert_eq!(
//!     OutputFormat::WaMe.render(&number, &config.output.jid_suffix),
//!     "https://wa.me/15551234567"
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DirectoryConfig, OutputConfig, ScanningConfig};
pub use error::{ConfigError, ConfigResult, NumscanError, Result};
pub use types::{OutputFormat, PhoneNumber};
