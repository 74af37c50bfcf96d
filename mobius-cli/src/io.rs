//! File/stdio plumbing shared by the commands.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use mobius_core::DetectorErrorModel;

/// Opens the given path for buffered reading, or stdin when absent.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(
            File::open(p).with_context(|| format!("opening {}", p.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Opens the given path for buffered writing, or stdout when absent.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Reads and parses a detector error model file.
pub fn read_dem_from_path(path: &Path) -> Result<DetectorErrorModel> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))
}

/// Reads and parses a detector error model from a reader.
pub fn read_dem_from_reader(reader: &mut dyn BufRead) -> Result<DetectorErrorModel> {
    let mut content = String::new();
    reader.read_to_string(&mut content).context("reading dem")?;
    content.parse().context("parsing dem")
}
