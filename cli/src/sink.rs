//! Result sinks: console display and the one-per-line output file.

use numscan_core::{OutputConfig, OutputFormat};
use numscan_scanner::{ScanOutcome, ScanProgress};
use std::io::{self, Write};

/// Consumer of scan outcomes.
pub trait ResultSink {
    /// Handle one outcome.
    fn accept(&mut self, outcome: &ScanOutcome) -> io::Result<()>;

    /// Flush buffered output once the stream has ended.
    fn finish(&mut self) -> io::Result<()>;
}

/// Human-readable (or JSON, when verbose) console output.
pub struct ConsoleSink<W: Write> {
    out: W,
    format: OutputFormat,
    jid_suffix: String,
    verbose: bool,
}

impl<W: Write> ConsoleSink<W> {
    /// Console sink writing to `out`.
    pub fn new(out: W, config: &OutputConfig) -> Self {
        Self {
            out,
            format: config.format,
            jid_suffix: config.jid_suffix.clone(),
            verbose: config.verbose,
        }
    }

    fn field(&mut self, label: &str, value: Option<&str>) -> io::Result<()> {
        match value {
            Some(value) if !value.is_empty() => writeln!(self.out, "    {label}: {value}"),
            _ => Ok(()),
        }
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    fn accept(&mut self, outcome: &ScanOutcome) -> io::Result<()> {
        let rendered = self.format.render(&outcome.number, &self.jid_suffix);

        if self.verbose {
            let record = serde_json::to_string(outcome).map_err(io::Error::other)?;
            return writeln!(self.out, "FOUND: {rendered} {record}");
        }

        writeln!(self.out, "[+] FOUND: {rendered}")?;
        self.field("Status", outcome.status.as_deref())?;
        self.field("Name", outcome.display_name.as_deref())?;
        self.field("Verified Name", outcome.verified_name.as_deref())?;
        if let Some(business) = &outcome.business {
            self.field("Email", business.email.as_deref())?;
            self.field("Website", business.website.as_deref())?;
            self.field("Address", business.address.as_deref())?;
        }
        self.field("Avatar", outcome.avatar_url.as_deref())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One rendered number per line.
pub struct LineFileSink<W: Write> {
    out: W,
    format: OutputFormat,
    jid_suffix: String,
}

impl<W: Write> LineFileSink<W> {
    /// Line sink writing to `out`.
    pub fn new(out: W, config: &OutputConfig) -> Self {
        Self {
            out,
            format: config.format,
            jid_suffix: config.jid_suffix.clone(),
        }
    }
}

impl<W: Write> ResultSink for LineFileSink<W> {
    fn accept(&mut self, outcome: &ScanOutcome) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            self.format.render(&outcome.number, &self.jid_suffix)
        )
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Status line for the periodic progress display.
#[must_use]
pub fn progress_line(progress: &ScanProgress) -> String {
    let processed = progress.processed();
    let found = progress.found();
    match (progress.percent_complete(), progress.total()) {
        (Some(percent), Some(total)) => {
            format!("[{percent:3.0}%] checked {processed}/{total}, found {found}")
        }
        _ => format!("[ ? %] checked {processed}, found {found}"),
    }
}
