use anyhow::Context;
use clap::Parser;
use dprob_rs::{DriftParams, QuadConfig, generate};
use quadpack_rs::constants::{DEFAULT_EPSABS, DEFAULT_EPSREL, DEFAULT_LIMIT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate the drift transition probability table
#[derive(Parser, Debug)]
#[command(name = "dprobgen", version, about, long_about = None, allow_negative_numbers = true)]
struct Args {
    /// Fraction of a segment in which no drift occurs
    pass_ratio: f64,

    /// Standard deviation of one drift step
    drift_stddev: f64,

    /// Largest drift, in whole symbols
    max_drift: u32,

    /// Segments per symbol
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    segments: u32,

    /// Output file [default: prob_table_r.._v.._d.._s...dat]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Absolute quadrature tolerance
    #[arg(long, default_value_t = DEFAULT_EPSABS)]
    epsabs: f64,

    /// Relative quadrature tolerance
    #[arg(long, default_value_t = DEFAULT_EPSREL)]
    epsrel: f64,

    /// Maximum subintervals per integral
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let params = DriftParams::new(args.pass_ratio, args.drift_stddev, args.max_drift, args.segments)
        .context("invalid drift parameters")?;
    let config = QuadConfig {
        epsabs: args.epsabs,
        epsrel: args.epsrel,
        limit: args.limit,
    };

    let path = generate(&params, &config, args.output.as_deref())
        .with_context(|| format!("failed to generate table for {params}"))?;
    tracing::info!(path = %path.display(), "done");
    Ok(())
}
