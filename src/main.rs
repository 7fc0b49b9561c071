//! Motorbench - Main entry point

use std::io::{self, Write};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use motorbench::cli::Cli;
use motorbench::commands;
use motorbench::config::BenchConfig;

/// Logs go to stderr so command output on stdout stays clean.
/// `RUST_LOG` overrides the `-v` level.
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("motorbench={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    info!("motorbench {} starting", env!("CARGO_PKG_VERSION"));

    let config = match BenchConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    debug!(?config, "configuration loaded");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = commands::execute(&cli.command, &config, &mut out);
    let _ = out.flush();

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
