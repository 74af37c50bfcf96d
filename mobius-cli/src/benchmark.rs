//! `mobius benchmark`: decode shots, compare against actual observable
//! flips, and report accuracy plus timing statistics.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;

use mobius_core::{Decoder, DecoderConfigOptions};

use crate::formats::{bytes_to_obsmask, read_record, ShotFormat};
use crate::io::{open_input, open_output, read_dem_from_path};
use crate::sampler::DemSampler;
use crate::stats::{calculate_percentiles, format_us};

/// Arguments of the benchmark command.
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Where to read the detector error model from.
    #[arg(long = "dem")]
    pub dem: PathBuf,

    /// Where to read detection event data from. When absent, shots are
    /// sampled from the model instead.
    #[arg(long = "in")]
    pub input: Option<PathBuf>,

    /// Format of the input detection event data.
    #[arg(long = "in_format", value_enum, default_value = "b8")]
    pub in_format: ShotFormat,

    /// If set, observables are appended to the detection event records.
    #[arg(long = "in_includes_appended_observables")]
    pub in_includes_appended_observables: bool,

    /// If set, actual observable flips are read from this separate file.
    #[arg(long = "obs_in")]
    pub obs_in: Option<PathBuf>,

    /// Format of the separate observable data.
    #[arg(long = "obs_in_format", value_enum, default_value = "b8")]
    pub obs_in_format: ShotFormat,

    /// Where to write results (defaults to stdout).
    #[arg(long = "out")]
    pub out: Option<PathBuf>,

    /// Number of shots to sample when no input file is given.
    #[arg(long = "shots", default_value_t = 10_000)]
    pub shots: usize,

    /// Random seed for sampled shots.
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,
}

struct BenchmarkResults {
    shots: usize,
    mistakes: usize,
    times: Vec<Duration>,
}

/// Runs the benchmark command.
pub fn run(args: &BenchmarkArgs) -> Result<()> {
    let dem = read_dem_from_path(&args.dem)?;
    let mut decoder = Decoder::from_dem(&dem, DecoderConfigOptions::default())
        .context("configuring the decoder")?;
    let num_dets = dem.count_detectors() as usize;
    let num_obs = dem.count_observables() as usize;

    let results = match &args.input {
        Some(_) => benchmark_from_files(args, &mut decoder, num_dets, num_obs)?,
        None => benchmark_sampled(args, &dem, &mut decoder)?,
    };

    let stats = calculate_percentiles(&results.times);
    let ler = if results.shots > 0 {
        results.mistakes as f64 / results.shots as f64
    } else {
        0.0
    };

    let mut out = open_output(args.out.as_deref())?;
    writeln!(out, "shots:            {}", results.shots)?;
    writeln!(out, "mistakes:         {}", results.mistakes)?;
    writeln!(out, "logical_error_rate: {:.3e}", ler)?;
    writeln!(out, "decode_latency_us:")?;
    writeln!(out, "    avg: {:>10}", format_us(stats.avg))?;
    writeln!(out, "    p50: {:>10}", format_us(stats.p50))?;
    writeln!(out, "    p95: {:>10}", format_us(stats.p95))?;
    writeln!(out, "    p99: {:>10}", format_us(stats.p99))?;
    out.flush()?;
    Ok(())
}

fn benchmark_from_files(
    args: &BenchmarkArgs,
    decoder: &mut Decoder,
    num_dets: usize,
    num_obs: usize,
) -> Result<BenchmarkResults> {
    if !args.in_includes_appended_observables && args.obs_in.is_none() {
        bail!(
            "benchmarking requires the actual observable flips: pass \
             --in_includes_appended_observables or --obs_in"
        );
    }

    let mut reader = open_input(args.input.as_deref())?;
    let mut obs_reader = match args.obs_in.as_deref() {
        Some(p) => Some(open_input(Some(p))?),
        None => None,
    };

    let record_bits =
        num_dets + if args.in_includes_appended_observables { num_obs } else { 0 };
    let mut record = vec![0u8; record_bits.div_ceil(8).max(1)];
    let mut obs_record = vec![0u8; num_obs.div_ceil(8).max(1)];

    let mut results = BenchmarkResults {
        shots: 0,
        mistakes: 0,
        times: Vec::new(),
    };
    while read_record(&mut *reader, args.in_format, record_bits, &mut record)? {
        let obs_actual = if let Some(obs_reader) = obs_reader.as_deref_mut() {
            if !read_record(obs_reader, args.obs_in_format, num_obs, &mut obs_record)? {
                bail!("fewer observable records than detection event records");
            }
            bytes_to_obsmask(&obs_record, num_obs)
        } else {
            let mut mask = 0u64;
            for k in 0..num_obs {
                let bit = num_dets + k;
                if record[bit / 8] >> (bit % 8) & 1 != 0 {
                    mask |= 1 << k;
                    record[bit / 8] &= !(1 << (bit % 8));
                }
            }
            mask
        };

        let t0 = Instant::now();
        let predicted = decoder
            .decode_detection_events(&record)
            .context("decoding a shot")?;
        results.times.push(t0.elapsed());
        results.shots += 1;
        results.mistakes += usize::from(predicted != obs_actual);
    }
    Ok(results)
}

fn benchmark_sampled(
    args: &BenchmarkArgs,
    dem: &mobius_core::DetectorErrorModel,
    decoder: &mut Decoder,
) -> Result<BenchmarkResults> {
    let mut sampler = DemSampler::new(dem, args.seed);
    let mut results = BenchmarkResults {
        shots: 0,
        mistakes: 0,
        times: Vec::new(),
    };
    for _ in 0..args.shots {
        let (shot, obs_actual) = sampler.sample();
        let t0 = Instant::now();
        let predicted = decoder
            .decode_detection_events(&shot)
            .context("decoding a sampled shot")?;
        results.times.push(t0.elapsed());
        results.shots += 1;
        results.mistakes += usize::from(predicted != obs_actual);
    }
    Ok(results)
}
