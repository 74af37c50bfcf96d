//! `mobius describe_decoder`: dump the decoder's internal representations.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use mobius_core::{Decoder, DecoderConfigOptions};

use crate::io::{open_input, open_output, read_dem_from_path, read_dem_from_reader};

/// Arguments of the describe_decoder command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Where to read a detector error model from (defaults to stdin).
    #[arg(long = "in")]
    pub input: Option<PathBuf>,

    /// Where to read a detector error model from (overrides --in).
    #[arg(long = "dem")]
    pub dem: Option<PathBuf>,

    /// Where to read a circuit from. Unsupported: configure from a detector
    /// error model instead.
    #[arg(long = "circuit")]
    pub circuit: Option<PathBuf>,

    /// Where to write output (defaults to stdout).
    #[arg(long = "out")]
    pub out: Option<PathBuf>,
}

/// Runs the describe_decoder command.
pub fn run(args: &DescribeArgs) -> Result<()> {
    if args.circuit.is_some() {
        bail!(
            "--circuit is not supported; convert the circuit to a detector error model \
             and pass it via --dem or --in"
        );
    }

    let dem = match &args.dem {
        Some(p) => read_dem_from_path(p)?,
        None => {
            let mut reader = open_input(args.input.as_deref())?;
            read_dem_from_reader(&mut reader)?
        }
    };

    let decoder = Decoder::from_dem(
        &dem,
        DecoderConfigOptions {
            include_coords_in_mobius_dem: true,
            ..DecoderConfigOptions::default()
        },
    )
    .context("configuring the decoder")?;

    let mut out = open_output(args.out.as_deref())?;
    writeln!(out, "{}", decoder)?;
    out.flush()?;
    Ok(())
}
