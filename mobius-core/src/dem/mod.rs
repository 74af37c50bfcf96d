//! Detector error model representation and text format support.

mod parser;
mod types;

pub use parser::{parse_dem, DemParseError};
pub use types::{DemInstruction, DemTarget, DetectorErrorModel};

pub(crate) use types::accumulate_coord_shift;
