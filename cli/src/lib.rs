//! numscan command-line shell
//!
//! This is the thin application shell that wires configuration, the
//! directory client, the scanner and the result sinks together. Core logic
//! lives in the `crates/` directory.

mod args;
mod sink;

pub use args::{parse_duration, Cli};
pub use sink::{progress_line, ConsoleSink, LineFileSink, ResultSink};

use anyhow::Context;
use numscan_core::{AppConfig, OutputConfig};
use numscan_directory::DirectoryClient;
use numscan_scanner::{prepare, CancellationToken, ScanConfig, ScanOrchestrator};
use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How often the progress line is refreshed.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Log filter used when `RUST_LOG` is not set.
fn default_filter(output: &OutputConfig) -> &'static str {
    if output.verbose {
        "info,numscan=debug"
    } else {
        "warn"
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing(output: &OutputConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(output)));

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(filter)
        .try_init();
}

/// Resolve configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config =
        AppConfig::load_with_env(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Run a scan as described by the command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let verbose = config.output.verbose;
    init_tracing(&config.output);
    info!("Starting numscan v{}", env!("CARGO_PKG_VERSION"));

    let pattern = prepare(&cli.pattern_text(), config.scanning.max_candidates)?;
    let client = DirectoryClient::new(&config.directory).context("failed to set up directory client")?;

    if !verbose {
        println!("numscan");
        println!("--------------------------");
        println!("Target Pattern: {pattern}");
        println!("Directory:      {}", client.base_url());
        if let Some(path) = &config.output.output_file {
            println!("Output File:    {}", path.display());
        }
        println!("--------------------------");
        println!("[-] Generated {} numbers to check.", pattern.cardinality());
    }

    let mut sinks: Vec<Box<dyn ResultSink + Send>> =
        vec![Box::new(ConsoleSink::new(io::stdout(), &config.output))];
    if let Some(path) = &config.output.output_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file {}", path.display()))?;
        sinks.push(Box::new(LineFileSink::new(BufWriter::new(file), &config.output)));
    }

    let scan_config = ScanConfig::from(&config.scanning);
    if !verbose {
        println!("[-] Starting scan with {} workers...", scan_config.concurrency);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n[-] Interrupted, stopping after in-flight lookups...");
            interrupt.cancel();
        }
    });

    let orchestrator = ScanOrchestrator::new(Arc::new(client), scan_config);
    let mut scan = orchestrator.start(pattern, cancel);
    let progress = scan.progress();
    info!("Scan {} running against {}", scan.scan_id(), config.directory.base_url);

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            next = scan.next_outcome() => {
                let Some(outcome) = next else { break };
                for sink in &mut sinks {
                    sink.accept(&outcome).context("failed to write result")?;
                }
            }
            _ = ticker.tick(), if !verbose => {
                println!("{}", progress_line(&progress));
            }
        }
    }

    for sink in &mut sinks {
        sink.finish().context("failed to flush results")?;
    }

    let summary = scan.join().await;
    println!();
    if summary.cancelled {
        println!("[-] Scan cancelled.");
    } else {
        println!("[-] Scan finished.");
    }
    println!(
        "[-] Checked: {} in {:.1}s",
        summary.processed,
        summary.elapsed.as_secs_f64()
    );
    println!("[-] Total found: {}", summary.found);

    Ok(())
}
