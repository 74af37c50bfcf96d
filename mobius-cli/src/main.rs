//! Command line front-end for the mobius color code decoder.
//!
//! # Usage
//!
//! ```bash
//! # Predict observable flips from detection event data.
//! mobius predict --dem model.dem --in shots.b8 --out predictions.01
//!
//! # Print accuracy and timing statistics collected while decoding.
//! mobius benchmark --dem model.dem --in shots.b8 --obs_in obs.b8
//!
//! # Sample shots from the model itself instead of reading a file.
//! mobius benchmark --dem model.dem --shots 100000 --seed 7
//!
//! # Describe the internal representations used to decode a given model.
//! mobius describe_decoder --dem model.dem
//! ```

mod benchmark;
mod describe;
mod formats;
mod io;
mod predict;
mod sampler;
mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mobius")]
#[command(about = "Color code decoder based on lifting mobius-graph matchings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict observable flips from detection event data.
    Predict(predict::PredictArgs),
    /// Print accuracy and timing statistics collected while decoding.
    Benchmark(benchmark::BenchmarkArgs),
    /// Describe the internal representations used to decode a given model.
    #[command(name = "describe_decoder")]
    DescribeDecoder(describe::DescribeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Predict(args) => predict::run(args),
        Commands::Benchmark(args) => benchmark::run(args),
        Commands::DescribeDecoder(args) => describe::run(args),
    }
}
