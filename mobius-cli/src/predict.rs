//! `mobius predict`: stream detection events in, observable predictions out.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mobius_core::{Decoder, DecoderConfigOptions};

use crate::formats::{obsmask_to_bytes, read_record, write_record, ShotFormat};
use crate::io::{open_input, open_output, read_dem_from_path};

/// Arguments of the predict command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Where to read the detector error model from.
    #[arg(long = "dem")]
    pub dem: PathBuf,

    /// Where to read detection event data (defaults to stdin).
    #[arg(long = "in")]
    pub input: Option<PathBuf>,

    /// Format of the input detection event data.
    #[arg(long = "in_format", value_enum, default_value = "b8")]
    pub in_format: ShotFormat,

    /// If set, input records include the observables as appended detectors
    /// whose values are ignored.
    #[arg(long = "in_includes_appended_observables")]
    pub in_includes_appended_observables: bool,

    /// Where to write predictions (defaults to stdout).
    #[arg(long = "out")]
    pub out: Option<PathBuf>,

    /// Format to use when writing predictions.
    #[arg(long = "out_format", value_enum, default_value = "01")]
    pub out_format: ShotFormat,
}

/// Runs the predict command.
pub fn run(args: &PredictArgs) -> Result<()> {
    let dem = read_dem_from_path(&args.dem)?;
    let mut decoder = Decoder::from_dem(&dem, DecoderConfigOptions::default())
        .context("configuring the decoder")?;

    let num_dets = dem.count_detectors() as usize;
    let num_obs = dem.count_observables() as usize;
    let record_bits =
        num_dets + if args.in_includes_appended_observables { num_obs } else { 0 };

    let mut reader = open_input(args.input.as_deref())?;
    let mut writer = open_output(args.out.as_deref())?;

    let mut record = vec![0u8; record_bits.div_ceil(8).max(1)];
    while read_record(&mut *reader, args.in_format, record_bits, &mut record)? {
        // Appended observable bits are not detection events; blank them.
        for k in num_dets..record_bits {
            record[k / 8] &= !(1 << (k % 8));
        }
        let prediction = decoder
            .decode_detection_events(&record)
            .context("decoding a shot")?;
        let bytes = obsmask_to_bytes(prediction, num_obs);
        write_record(&mut *writer, args.out_format, num_obs, &bytes)?;
    }
    writer.flush()?;
    Ok(())
}
