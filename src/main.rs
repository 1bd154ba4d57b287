use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use racecount::harness::{DEFAULT_ITERATIONS, DEFAULT_THREADS};
use racecount::{parse_count, Config, Harness};

/// Increment shared counters from many threads, atomically and not.
///
/// Counts accept hex (0x..) and octal (0..) literals.
#[derive(Parser, Debug)]
#[clap(name = "racecount", version)]
struct Args {
    /// Number of worker threads
    #[clap(value_name = "THREADS", default_value_t = DEFAULT_THREADS, value_parser = parse_count::<usize>)]
    threads: usize,

    /// Increments each thread applies to every counter
    #[clap(value_name = "ITERATIONS", default_value_t = DEFAULT_ITERATIONS, value_parser = parse_count::<u64>)]
    iterations: u64,
}

fn init_logging() {
    let fmt = tracing_subscriber::fmt::layer()
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    Registry::default().with(filter).with(fmt).init();
}

fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    let config = Config::new(args.threads, args.iterations).context("invalid configuration")?;

    let report = Harness::new(config).run();

    let stdout = io::stdout();
    report
        .write_to(&mut stdout.lock())
        .context("counter race failed")?;

    Ok(())
}
