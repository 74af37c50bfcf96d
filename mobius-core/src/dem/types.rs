//! Owned representation of a detector error model.
//!
//! A detector error model (DEM) is an ordered list of instructions:
//!
//! - `error(p) D0 D1 ^ L0` — an error mechanism with probability `p` that
//!   flips the listed detectors and observables. `^` separates independently
//!   matchable components of the same mechanism.
//! - `detector(x, y, t, c) D0` — declares a detector and its coordinates.
//! - `shift_detectors(dx, dy, dt, dc) N` — shifts the coordinate system and
//!   the detector indexing for all subsequent instructions.
//! - `repeat N { ... }` — repeats a block of instructions N times.
//! - `logical_observable L0` — declares a logical observable.
//!
//! Detector indices inside instructions are relative: the absolute index of
//! `D5` is `5` plus the sum of all detector shifts executed so far. Flattening
//! resolves these offsets and expands repeat blocks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One target of an error instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DemTarget {
    /// A detector flipped by the error (`D<id>`, relative to the current shift).
    Detector(u64),
    /// A logical observable flipped by the error (`L<id>`).
    Observable(u32),
    /// The component separator (`^`).
    Separator,
}

impl DemTarget {
    /// Detector index if this target is a detector.
    #[must_use]
    pub const fn detector_id(&self) -> Option<u64> {
        match self {
            DemTarget::Detector(d) => Some(*d),
            _ => None,
        }
    }

    /// True when this target is the `^` separator.
    #[must_use]
    pub const fn is_separator(&self) -> bool {
        matches!(self, DemTarget::Separator)
    }
}

impl fmt::Display for DemTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemTarget::Detector(d) => write!(f, "D{}", d),
            DemTarget::Observable(o) => write!(f, "L{}", o),
            DemTarget::Separator => write!(f, "^"),
        }
    }
}

/// One instruction of a detector error model.
#[derive(Clone, Debug, PartialEq)]
pub enum DemInstruction {
    /// An error mechanism.
    Error {
        /// Probability that the mechanism fires in one shot.
        probability: f64,
        /// Flipped detectors and observables, with optional `^` separators.
        targets: Vec<DemTarget>,
    },
    /// A detector declaration with optional coordinates.
    Detector {
        /// Coordinates before applying accumulated shifts. May be empty.
        coords: Vec<f64>,
        /// Declared detector indices (relative to the current shift).
        targets: Vec<u64>,
    },
    /// A coordinate and detector-index shift.
    ShiftDetectors {
        /// Per-coordinate offsets added to all later declarations.
        coords: Vec<f64>,
        /// Amount added to all later detector indices.
        detectors: u64,
    },
    /// A repeated block of instructions.
    Repeat {
        /// Number of repetitions.
        repetitions: u64,
        /// The repeated body.
        block: DetectorErrorModel,
    },
    /// A logical observable declaration.
    LogicalObservable {
        /// Observable index.
        index: u32,
    },
}

/// An ordered list of DEM instructions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectorErrorModel {
    /// The instructions, in declaration order.
    pub instructions: Vec<DemInstruction>,
}

impl DetectorErrorModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    /// Appends an error instruction.
    pub fn append_error_instruction(&mut self, probability: f64, targets: Vec<DemTarget>) {
        self.instructions.push(DemInstruction::Error {
            probability,
            targets,
        });
    }

    /// Appends a detector declaration for a single detector index.
    pub fn append_detector_instruction(&mut self, coords: Vec<f64>, detector: u64) {
        self.instructions.push(DemInstruction::Detector {
            coords,
            targets: vec![detector],
        });
    }

    /// Number of detectors, resolved across shifts and repeat blocks.
    ///
    /// This is one past the largest absolute detector index referenced by any
    /// instruction (declaration or error).
    #[must_use]
    pub fn count_detectors(&self) -> u64 {
        self.detector_stats().0
    }

    /// Number of observables (one past the largest observable index).
    #[must_use]
    pub fn count_observables(&self) -> u64 {
        let mut max = 0u64;
        self.observable_stats(&mut max);
        max
    }

    /// Returns `(one past the max detector index, total detector shift)`,
    /// both relative to the model's entry point.
    fn detector_stats(&self) -> (u64, u64) {
        let mut max = 0u64;
        let mut offset = 0u64;
        for inst in &self.instructions {
            match inst {
                DemInstruction::Error { targets, .. } => {
                    for t in targets {
                        if let DemTarget::Detector(d) = t {
                            max = max.max(offset + d + 1);
                        }
                    }
                }
                DemInstruction::Detector { targets, .. } => {
                    for d in targets {
                        max = max.max(offset + d + 1);
                    }
                }
                DemInstruction::ShiftDetectors { detectors, .. } => {
                    offset += detectors;
                }
                DemInstruction::Repeat { repetitions, block } => {
                    if *repetitions > 0 {
                        let (block_max, block_shift) = block.detector_stats();
                        if block_max > 0 {
                            max = max.max(offset + (repetitions - 1) * block_shift + block_max);
                        }
                        offset += repetitions * block_shift;
                    }
                }
                DemInstruction::LogicalObservable { .. } => {}
            }
        }
        (max, offset)
    }

    fn observable_stats(&self, max: &mut u64) {
        for inst in &self.instructions {
            match inst {
                DemInstruction::Error { targets, .. } => {
                    for t in targets {
                        if let DemTarget::Observable(o) = t {
                            *max = (*max).max(u64::from(*o) + 1);
                        }
                    }
                }
                DemInstruction::LogicalObservable { index } => {
                    *max = (*max).max(u64::from(*index) + 1);
                }
                DemInstruction::Repeat { block, .. } => block.observable_stats(max),
                _ => {}
            }
        }
    }

    /// Visits every error instruction with repeat blocks expanded and
    /// detector indices resolved to absolute values.
    pub fn for_each_flattened_error<F: FnMut(f64, &[DemTarget])>(&self, f: &mut F) {
        let mut offset = 0u64;
        let mut buf: Vec<DemTarget> = Vec::new();
        self.flatten_helper(&mut offset, &mut buf, f);
    }

    fn flatten_helper<F: FnMut(f64, &[DemTarget])>(
        &self,
        offset: &mut u64,
        buf: &mut Vec<DemTarget>,
        f: &mut F,
    ) {
        for inst in &self.instructions {
            match inst {
                DemInstruction::Error {
                    probability,
                    targets,
                } => {
                    buf.clear();
                    for t in targets {
                        buf.push(match t {
                            DemTarget::Detector(d) => DemTarget::Detector(d + *offset),
                            other => *other,
                        });
                    }
                    f(*probability, buf);
                }
                DemInstruction::ShiftDetectors { detectors, .. } => {
                    *offset += detectors;
                }
                DemInstruction::Repeat { repetitions, block } => {
                    for _ in 0..*repetitions {
                        block.flatten_helper(offset, buf, f);
                    }
                }
                DemInstruction::Detector { .. } | DemInstruction::LogicalObservable { .. } => {}
            }
        }
    }

    /// Looks up the shifted coordinates of the requested absolute detector
    /// indices. Detectors without a declaration are absent from the result.
    #[must_use]
    pub fn detector_coordinates(&self, wanted: &BTreeSet<u64>) -> BTreeMap<u64, Vec<f64>> {
        let mut out = BTreeMap::new();
        let mut det_offset = 0u64;
        let mut coord_offsets: Vec<f64> = Vec::new();
        self.coords_helper(&mut det_offset, &mut coord_offsets, wanted, &mut out);
        out
    }

    fn coords_helper(
        &self,
        det_offset: &mut u64,
        coord_offsets: &mut Vec<f64>,
        wanted: &BTreeSet<u64>,
        out: &mut BTreeMap<u64, Vec<f64>>,
    ) {
        for inst in &self.instructions {
            match inst {
                DemInstruction::Detector { coords, targets } => {
                    for d in targets {
                        let n = d + *det_offset;
                        if wanted.contains(&n) {
                            let mut cs = coords.clone();
                            for (k, off) in coord_offsets.iter().enumerate() {
                                if k < cs.len() {
                                    cs[k] += off;
                                }
                            }
                            out.insert(n, cs);
                        }
                    }
                }
                DemInstruction::ShiftDetectors { coords, detectors } => {
                    *det_offset += detectors;
                    accumulate_coord_shift(coord_offsets, coords);
                }
                DemInstruction::Repeat { repetitions, block } => {
                    for _ in 0..*repetitions {
                        block.coords_helper(det_offset, coord_offsets, wanted, out);
                    }
                }
                _ => {}
            }
        }
    }

    /// Structural comparison with a probability/coordinate tolerance.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, atol: f64) -> bool {
        if self.instructions.len() != other.instructions.len() {
            return false;
        }
        self.instructions
            .iter()
            .zip(&other.instructions)
            .all(|(a, b)| instructions_approx_eq(a, b, atol))
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        for inst in &self.instructions {
            match inst {
                DemInstruction::Error {
                    probability,
                    targets,
                } => {
                    write!(f, "{}error({})", pad, probability)?;
                    for t in targets {
                        write!(f, " {}", t)?;
                    }
                    writeln!(f)?;
                }
                DemInstruction::Detector { coords, targets } => {
                    write!(f, "{}detector", pad)?;
                    write_coords(f, coords)?;
                    for d in targets {
                        write!(f, " D{}", d)?;
                    }
                    writeln!(f)?;
                }
                DemInstruction::ShiftDetectors { coords, detectors } => {
                    write!(f, "{}shift_detectors", pad)?;
                    write_coords(f, coords)?;
                    writeln!(f, " {}", detectors)?;
                }
                DemInstruction::Repeat { repetitions, block } => {
                    writeln!(f, "{}repeat {} {{", pad, repetitions)?;
                    block.fmt_indented(f, indent + 1)?;
                    writeln!(f, "{}}}", pad)?;
                }
                DemInstruction::LogicalObservable { index } => {
                    writeln!(f, "{}logical_observable L{}", pad, index)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for DetectorErrorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Adds a coordinate shift into an accumulated offset vector, growing the
/// vector as needed.
pub(crate) fn accumulate_coord_shift(coord_offsets: &mut Vec<f64>, coords: &[f64]) {
    if coord_offsets.len() < coords.len() {
        coord_offsets.resize(coords.len(), 0.0);
    }
    for (k, c) in coords.iter().enumerate() {
        coord_offsets[k] += c;
    }
}

fn write_coords(f: &mut fmt::Formatter<'_>, coords: &[f64]) -> fmt::Result {
    if coords.is_empty() {
        return Ok(());
    }
    write!(f, "(")?;
    for (k, c) in coords.iter().enumerate() {
        if k > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, ")")
}

fn instructions_approx_eq(a: &DemInstruction, b: &DemInstruction, atol: f64) -> bool {
    match (a, b) {
        (
            DemInstruction::Error {
                probability: pa,
                targets: ta,
            },
            DemInstruction::Error {
                probability: pb,
                targets: tb,
            },
        ) => (pa - pb).abs() <= atol && ta == tb,
        (
            DemInstruction::Detector {
                coords: ca,
                targets: ta,
            },
            DemInstruction::Detector {
                coords: cb,
                targets: tb,
            },
        ) => ta == tb && coords_approx_eq(ca, cb, atol),
        (
            DemInstruction::ShiftDetectors {
                coords: ca,
                detectors: da,
            },
            DemInstruction::ShiftDetectors {
                coords: cb,
                detectors: db,
            },
        ) => da == db && coords_approx_eq(ca, cb, atol),
        (
            DemInstruction::Repeat {
                repetitions: ra,
                block: ba,
            },
            DemInstruction::Repeat {
                repetitions: rb,
                block: bb,
            },
        ) => ra == rb && ba.approx_eq(bb, atol),
        (
            DemInstruction::LogicalObservable { index: ia },
            DemInstruction::LogicalObservable { index: ib },
        ) => ia == ib,
        _ => false,
    }
}

fn coords_approx_eq(a: &[f64], b: &[f64], atol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= atol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_detectors_with_shifts() {
        let dem: DetectorErrorModel = "
            detector(0, 0, 0, 0) D0
            shift_detectors(0, 0, 1) 2
            detector(0, 0, 0, 1) D1
            error(0.1) D0 D2
        "
        .parse()
        .unwrap();
        // D1 after a shift of 2 is absolute detector 3, D2 is absolute 4.
        assert_eq!(dem.count_detectors(), 5);
    }

    #[test]
    fn count_detectors_in_repeat_block() {
        let dem: DetectorErrorModel = "
            repeat 3 {
                detector(0, 0, 0, 4) D0
                shift_detectors(0, 0, 1) 2
            }
        "
        .parse()
        .unwrap();
        // Iterations declare absolute detectors 0, 2, 4.
        assert_eq!(dem.count_detectors(), 5);
    }

    #[test]
    fn flatten_applies_shifts_inside_repeats() {
        let dem: DetectorErrorModel = "
            repeat 2 {
                error(0.25) D0 D1 ^ L0
                shift_detectors 2
            }
        "
        .parse()
        .unwrap();
        let mut seen = Vec::new();
        dem.for_each_flattened_error(&mut |p, targets| {
            seen.push((p, targets.to_vec()));
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].1,
            vec![
                DemTarget::Detector(0),
                DemTarget::Detector(1),
                DemTarget::Separator,
                DemTarget::Observable(0)
            ]
        );
        assert_eq!(
            seen[1].1,
            vec![
                DemTarget::Detector(2),
                DemTarget::Detector(3),
                DemTarget::Separator,
                DemTarget::Observable(0)
            ]
        );
    }

    #[test]
    fn detector_coordinates_apply_offsets() {
        let dem: DetectorErrorModel = "
            detector(1, 2, 0) D0
            shift_detectors(0, 0, 1) 1
            detector(1, 2, 0) D0
        "
        .parse()
        .unwrap();
        let wanted: BTreeSet<u64> = [0u64, 1u64].into_iter().collect();
        let coords = dem.detector_coordinates(&wanted);
        assert_eq!(coords[&0], vec![1.0, 2.0, 0.0]);
        assert_eq!(coords[&1], vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn display_round_trips_through_parser() {
        let text = "\
error(0.125) D0 D1 ^ L0
detector(1.5, 2, 0, 3) D2
shift_detectors(0, 0, 1) 3
repeat 2 {
    error(0.25) D0
}
logical_observable L1
";
        let dem: DetectorErrorModel = text.parse().unwrap();
        assert_eq!(dem.to_string(), text);
    }

    #[test]
    fn approx_eq_tolerates_probability_noise() {
        let a: DetectorErrorModel = "error(0.1) D0 D1".parse().unwrap();
        let b: DetectorErrorModel = "error(0.1000001) D0 D1".parse().unwrap();
        assert!(a.approx_eq(&b, 1e-5));
        assert!(!a.approx_eq(&b, 1e-9));
    }
}
