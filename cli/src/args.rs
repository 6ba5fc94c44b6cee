//! Command-line arguments.

use clap::Parser;
use numscan_core::{AppConfig, OutputFormat};
use std::path::PathBuf;
use std::time::Duration;

/// Find registered numbers matching a phone-number pattern.
#[derive(Debug, Parser)]
#[command(name = "numscan", version)]
#[command(after_help = "Examples:
  Standard:   numscan \"15551234567[x]\"
  Parallel:   numscan --concurrency 4 \"155512345xx\"
  Ranges:     numscan --output-file hits.txt \"15551234[5-9]x\"")]
pub struct Cli {
    /// Target pattern, e.g. 15551234567[x] or +1 555 123 45xx.
    /// Digits, `x` for any digit, `[...]` for a digit set; spaces and `+` are ignored.
    #[arg(value_name = "PATTERN", required = true, num_args = 1..)]
    pub pattern: Vec<String>,

    /// Number of parallel workers
    #[arg(long, short = 'c', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Delay between checks, per worker (e.g. 200ms, 1s, 1.5s)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub delay: Option<Duration>,

    /// Upper bound of the random jitter added to each delay
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub jitter: Option<Duration>,

    /// Timeout for a single lookup (0 disables)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Refuse patterns expanding to more candidates than this
    #[arg(long, value_name = "N")]
    pub max_candidates: Option<u64>,

    /// Result output format: wa.me, jid or pn
    #[arg(long, value_name = "FORMAT")]
    pub output_format: Option<OutputFormat>,

    /// Write one result per line to this file
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Directory service base URL
    #[arg(long, value_name = "URL")]
    pub directory_url: Option<String>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging and full result records
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// The pattern arguments joined into one string, as typed.
    #[must_use]
    pub fn pattern_text(&self) -> String {
        self.pattern.concat()
    }

    /// Apply flags on top of file and environment configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(concurrency) = self.concurrency {
            config.scanning.concurrency = concurrency;
        }
        if let Some(delay) = self.delay {
            config.scanning.delay_ms = millis(delay);
        }
        if let Some(jitter) = self.jitter {
            config.scanning.jitter_ms = millis(jitter);
        }
        if let Some(timeout) = self.timeout {
            config.scanning.lookup_timeout_secs = timeout.as_secs();
            if timeout.subsec_nanos() > 0 {
                config.scanning.lookup_timeout_secs += 1;
            }
        }
        if let Some(max) = self.max_candidates {
            config.scanning.max_candidates = max;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
        if let Some(path) = &self.output_file {
            config.output.output_file = Some(path.clone());
        }
        if let Some(url) = &self.directory_url {
            config.directory.base_url.clone_from(url);
        }
        if self.verbose {
            config.output.verbose = true;
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parse `250ms`, `2s`, `1.5s`, `1m` or a bare number of milliseconds.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (value, unit) = input.split_at(split);

    let value: f64 = value
        .parse()
        .map_err(|_| format!("invalid duration '{input}'"))?;
    let millis = match unit {
        "" | "ms" => value,
        "s" => value * 1_000.0,
        "m" => value * 60_000.0,
        _ => return Err(format!("unknown duration unit '{unit}' (use ms, s or m)")),
    };

    let nanos = (millis * 1_000_000.0).round();
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(format!("duration '{input}' is out of range"));
    }
    Ok(Duration::from_nanos(nanos as u64))
}
