//! Text parser for the detector error model format.
//!
//! The format is line oriented. Blank lines and `#` comments are skipped.
//! Supported instructions:
//!
//! ```text
//! error(0.001) D0 D1 ^ L0
//! detector(1.5, 2.5, 0, 3) D0
//! shift_detectors(0, 0, 1, 0) 9
//! shift_detectors 9
//! logical_observable L0
//! repeat 24 {
//!     ...
//! }
//! ```
//!
//! Repeat blocks nest and are preserved structurally; flattening happens on
//! demand (see [`DetectorErrorModel::for_each_flattened_error`]).

use std::fmt;
use std::str::FromStr;

use super::types::{DemInstruction, DemTarget, DetectorErrorModel};

/// Error type for DEM parsing.
///
/// Each variant carries the problematic content to help with debugging.
#[derive(Debug, Clone)]
pub enum DemParseError {
    /// A line that doesn't match any known DEM instruction.
    InvalidSyntax(String),

    /// A probability that couldn't be parsed as a float.
    InvalidProbability(String),

    /// A detector ID that couldn't be parsed.
    InvalidDetectorId(String),

    /// An observable ID that couldn't be parsed.
    InvalidObservableId(String),

    /// A `repeat` block without a matching closing brace, or a stray brace.
    UnbalancedRepeatBlock(String),
}

impl fmt::Display for DemParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemParseError::InvalidSyntax(msg) => write!(f, "Invalid syntax: {}", msg),
            DemParseError::InvalidProbability(msg) => write!(f, "Invalid probability: {}", msg),
            DemParseError::InvalidDetectorId(msg) => write!(f, "Invalid detector ID: {}", msg),
            DemParseError::InvalidObservableId(msg) => write!(f, "Invalid observable ID: {}", msg),
            DemParseError::UnbalancedRepeatBlock(msg) => {
                write!(f, "Unbalanced repeat block: {}", msg)
            }
        }
    }
}

impl std::error::Error for DemParseError {}

/// Parses DEM text into a [`DetectorErrorModel`].
pub fn parse_dem(content: &str) -> Result<DetectorErrorModel, DemParseError> {
    let lines: Vec<&str> = content
        .lines()
        .map(|line| {
            let line = line.split('#').next().unwrap_or("");
            line.trim()
        })
        .collect();
    let mut cursor = 0usize;
    let dem = parse_block(&lines, &mut cursor, false)?;
    if cursor < lines.len() {
        return Err(DemParseError::UnbalancedRepeatBlock(
            lines[cursor].to_string(),
        ));
    }
    Ok(dem)
}

fn parse_block(
    lines: &[&str],
    cursor: &mut usize,
    inside_repeat: bool,
) -> Result<DetectorErrorModel, DemParseError> {
    let mut dem = DetectorErrorModel::new();
    while *cursor < lines.len() {
        let line = lines[*cursor];
        *cursor += 1;
        if line.is_empty() {
            continue;
        }
        if line == "}" {
            if inside_repeat {
                return Ok(dem);
            }
            return Err(DemParseError::UnbalancedRepeatBlock("}".to_string()));
        }
        if let Some(rest) = line.strip_prefix("repeat") {
            let rest = rest.trim();
            let count_str = rest.strip_suffix('{').unwrap_or(rest).trim();
            let repetitions: u64 = count_str
                .parse()
                .map_err(|_| DemParseError::InvalidSyntax(line.to_string()))?;
            let block = parse_block(lines, cursor, true)?;
            dem.instructions
                .push(DemInstruction::Repeat { repetitions, block });
        } else if line.starts_with("error") {
            dem.instructions.push(parse_error_line(line)?);
        } else if line.starts_with("detector") {
            dem.instructions.push(parse_detector_line(line)?);
        } else if line.starts_with("shift_detectors") {
            dem.instructions.push(parse_shift_line(line)?);
        } else if line.starts_with("logical_observable") {
            dem.instructions.push(parse_observable_line(line)?);
        } else {
            return Err(DemParseError::InvalidSyntax(line.to_string()));
        }
    }
    if inside_repeat {
        return Err(DemParseError::UnbalancedRepeatBlock(
            "missing closing brace".to_string(),
        ));
    }
    Ok(dem)
}

/// Splits `name(args) rest` into the parenthesized argument list and the
/// remainder. Returns an empty argument list when there are no parentheses.
fn split_parens<'a>(line: &'a str, name: &str) -> Result<(Vec<f64>, &'a str), DemParseError> {
    let rest = &line[name.len()..];
    if let Some(rest) = rest.trim_start().strip_prefix('(') {
        let close = rest
            .find(')')
            .ok_or_else(|| DemParseError::InvalidSyntax(line.to_string()))?;
        let args = rest[..close]
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| DemParseError::InvalidSyntax(line.to_string()))?;
        Ok((args, &rest[close + 1..]))
    } else {
        Ok((Vec::new(), rest))
    }
}

fn parse_error_line(line: &str) -> Result<DemInstruction, DemParseError> {
    let (args, rest) = split_parens(line, "error")?;
    if args.len() != 1 || !(0.0..=1.0).contains(&args[0]) {
        return Err(DemParseError::InvalidProbability(line.to_string()));
    }
    let mut targets = Vec::new();
    for token in rest.split_whitespace() {
        if token == "^" {
            targets.push(DemTarget::Separator);
        } else if let Some(id) = token.strip_prefix('D') {
            let id: u64 = id
                .parse()
                .map_err(|_| DemParseError::InvalidDetectorId(token.to_string()))?;
            targets.push(DemTarget::Detector(id));
        } else if let Some(id) = token.strip_prefix('L') {
            let id: u32 = id
                .parse()
                .map_err(|_| DemParseError::InvalidObservableId(token.to_string()))?;
            targets.push(DemTarget::Observable(id));
        } else {
            return Err(DemParseError::InvalidSyntax(line.to_string()));
        }
    }
    Ok(DemInstruction::Error {
        probability: args[0],
        targets,
    })
}

fn parse_detector_line(line: &str) -> Result<DemInstruction, DemParseError> {
    let (coords, rest) = split_parens(line, "detector")?;
    let mut targets = Vec::new();
    for token in rest.split_whitespace() {
        let id = token
            .strip_prefix('D')
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or_else(|| DemParseError::InvalidDetectorId(token.to_string()))?;
        targets.push(id);
    }
    if targets.is_empty() {
        return Err(DemParseError::InvalidSyntax(line.to_string()));
    }
    Ok(DemInstruction::Detector { coords, targets })
}

fn parse_shift_line(line: &str) -> Result<DemInstruction, DemParseError> {
    let (coords, rest) = split_parens(line, "shift_detectors")?;
    let rest = rest.trim();
    let detectors = if rest.is_empty() {
        0
    } else {
        rest.parse::<u64>()
            .map_err(|_| DemParseError::InvalidSyntax(line.to_string()))?
    };
    Ok(DemInstruction::ShiftDetectors { coords, detectors })
}

fn parse_observable_line(line: &str) -> Result<DemInstruction, DemParseError> {
    let rest = line["logical_observable".len()..].trim();
    let index = rest
        .strip_prefix('L')
        .and_then(|id| id.parse::<u32>().ok())
        .ok_or_else(|| DemParseError::InvalidObservableId(line.to_string()))?;
    Ok(DemInstruction::LogicalObservable { index })
}

impl FromStr for DetectorErrorModel {
    type Err = DemParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dem(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_error() {
        let dem = parse_dem("error(0.1) D0 D1\n").unwrap();
        assert_eq!(dem.instructions.len(), 1);
        assert_eq!(
            dem.instructions[0],
            DemInstruction::Error {
                probability: 0.1,
                targets: vec![DemTarget::Detector(0), DemTarget::Detector(1)],
            }
        );
    }

    #[test]
    fn parses_error_with_separator_and_observables() {
        let dem = parse_dem("error(0.01) D0 D1 ^ D2 D3 ^ L0 L3\n").unwrap();
        match &dem.instructions[0] {
            DemInstruction::Error { targets, .. } => {
                assert_eq!(targets.iter().filter(|t| t.is_separator()).count(), 2);
                assert_eq!(targets.last(), Some(&DemTarget::Observable(3)));
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn parses_detector_with_coords() {
        let dem = parse_dem("detector(1.5, 2.5, 0, 4) D7\n").unwrap();
        assert_eq!(
            dem.instructions[0],
            DemInstruction::Detector {
                coords: vec![1.5, 2.5, 0.0, 4.0],
                targets: vec![7],
            }
        );
    }

    #[test]
    fn parses_nested_repeat_blocks() {
        let dem = parse_dem(
            "
            repeat 2 {
                error(0.1) D0
                repeat 3 {
                    shift_detectors 1
                }
            }
            ",
        )
        .unwrap();
        match &dem.instructions[0] {
            DemInstruction::Repeat { repetitions, block } => {
                assert_eq!(*repetitions, 2);
                assert_eq!(block.instructions.len(), 2);
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn parses_bare_and_coordinate_shift() {
        let dem = parse_dem("shift_detectors 4\nshift_detectors(0, 0, 1) 2\n").unwrap();
        assert_eq!(
            dem.instructions[0],
            DemInstruction::ShiftDetectors {
                coords: vec![],
                detectors: 4
            }
        );
        assert_eq!(
            dem.instructions[1],
            DemInstruction::ShiftDetectors {
                coords: vec![0.0, 0.0, 1.0],
                detectors: 2
            }
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let dem = parse_dem("# header\n\nerror(0.1) D0 # trailing\n").unwrap();
        assert_eq!(dem.instructions.len(), 1);
    }

    #[test]
    fn rejects_bad_probability() {
        assert!(matches!(
            parse_dem("error(1.5) D0\n"),
            Err(DemParseError::InvalidProbability(_))
        ));
        assert!(matches!(
            parse_dem("error(abc) D0\n"),
            Err(DemParseError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn rejects_unbalanced_repeat() {
        assert!(matches!(
            parse_dem("repeat 2 {\nerror(0.1) D0\n"),
            Err(DemParseError::UnbalancedRepeatBlock(_))
        ));
        assert!(matches!(
            parse_dem("}\n"),
            Err(DemParseError::UnbalancedRepeatBlock(_))
        ));
    }

    #[test]
    fn rejects_unknown_instruction() {
        assert!(matches!(
            parse_dem("frobnicate D0\n"),
            Err(DemParseError::InvalidSyntax(_))
        ));
    }
}
