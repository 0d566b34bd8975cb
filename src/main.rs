//! poolrng CLI
//!
//! Assembles a generator from the platform's entropy sources and prints
//! random bytes as hex.

use clap::Parser;
use poolrng::{
    metrics::{MetricsRegistry, MetricsSnapshot},
    FileConfig, RandomNumberGenerator,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Generate random bytes from the platform's entropy sources.
#[derive(Debug, Parser)]
#[command(name = "poolrng", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of random bytes to print.
    #[arg(short, long)]
    bytes: Option<usize>,

    /// Use the entropy pool directly, without the X9.31 wrapper.
    #[arg(long)]
    no_wrapper: bool,

    /// Print Prometheus metrics after the output.
    #[arg(long)]
    metrics: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("poolrng v{}", poolrng::VERSION);

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => FileConfig::default(),
    };
    if cli.no_wrapper {
        config.rng.compliance_wrapper = false;
    }
    if let Some(bytes) = cli.bytes {
        config.output.bytes = bytes;
    }
    let show_metrics = cli.metrics || config.output.metrics;

    let mut rng = match poolrng::make_rng_with(&config.rng) {
        Ok(rng) => rng,
        Err(e) => {
            error!("Failed to assemble generator: {}", e);
            std::process::exit(1);
        }
    };

    let mut output = vec![0u8; config.output.bytes];
    if let Err(e) = rng.randomize(&mut output) {
        error!("Generation failed: {}", e);
        std::process::exit(1);
    }

    println!(
        "{}",
        output
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>()
    );

    if show_metrics {
        let registry = match MetricsRegistry::new() {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to create metrics registry: {}", e);
                std::process::exit(1);
            }
        };
        registry.update(&MetricsSnapshot::from_stats(&rng.stats()));
        match registry.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => error!("Failed to encode metrics: {}", e),
        }
    }

    info!(generator = %rng.name(), bytes = output.len(), "Done");
}
