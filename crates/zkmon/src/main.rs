//! zkmon - ZooKeeper metrics collector.
//!
//! Polls a server through its four-letter-word admin commands (`mntr`,
//! `ruok`) using an external probe such as `nc`, and prints one JSON
//! sample per collection cycle on stdout.

mod output;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use zkmon_core::collector::{CollectError, Collector, ProbeExecutor, ProbeRunner};
use zkmon_core::model::CanonicalMetricSet;

use output::Sample;

/// ZooKeeper metrics collector.
#[derive(Parser, Debug)]
#[command(name = "zkmon", about = "ZooKeeper metrics collector", version)]
struct Args {
    /// ZooKeeper host to poll.
    #[arg(long, env = "ZK_HOST", default_value = "localhost")]
    host: String,

    /// ZooKeeper client port.
    #[arg(long, env = "ZK_PORT", default_value_t = 2181)]
    port: u16,

    /// Probe executable used to send commands (invoked as `<cmd> <host> <port>`).
    #[arg(long, env = "ZK_CMD", default_value = "nc")]
    cmd: String,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Timeout for a single probe invocation, in seconds.
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Collect a single sample and exit (nonzero when no metrics were found).
    #[arg(long)]
    once: bool,

    /// Pretty-print emitted JSON.
    #[arg(long)]
    pretty: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr; stdout carries the samples.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["zkmon", "zkmon_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints one sample to stdout.
fn emit(set: &CanonicalMetricSet, pretty: bool) {
    let sample = Sample::new(Utc::now().timestamp(), set);
    match output::render(&sample, pretty) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize sample: {}", e),
    }
}

/// Runs one collection cycle and emits its result.
fn poll<P: ProbeExecutor>(
    collector: &mut Collector<P>,
    pretty: bool,
) -> Result<(), CollectError> {
    let set = collector.collect()?;

    if let Some(timing) = collector.last_timing() {
        debug!(
            "Cycle timing: total={:?} stats={:?} health={:?} mapping={:?}",
            timing.total, timing.stats, timing.health, timing.mapping
        );
    }
    info!("Sample: {}", output::describe(&set));
    emit(&set, pretty);
    Ok(())
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("zkmon {} starting", env!("CARGO_PKG_VERSION"));

    // Setup graceful shutdown; the same flag cancels an in-flight probe
    let running = Arc::new(AtomicBool::new(true));
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let running = running.clone();
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
            cancel.store(true, Ordering::SeqCst);
        }) {
            warn!("Failed to set Ctrl-C handler: {}", e);
        }
    }

    let probe = ProbeRunner::new(&args.cmd)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_cancel_flag(cancel);
    let mut collector = Collector::new(probe, args.host.trim(), args.port);

    info!(
        "Config: target={}:{}, cmd={}, interval={}s, timeout={:?}",
        collector.host(),
        collector.port(),
        collector.probe().executable(),
        args.interval,
        collector.probe().timeout()
    );

    if args.once {
        if let Err(e) = poll(&mut collector, args.pretty) {
            error!("Collection failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let interval = Duration::from_secs(args.interval);
    let mut cycle: u64 = 0;

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        cycle += 1;
        if let Err(e) = poll(&mut collector, args.pretty) {
            error!("Cycle #{}: {}", cycle, e);
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete after {} cycles", cycle);
}
