//! Resolves each detector's color/basis annotation from its coordinates.
//!
//! The 4th coordinate of each detector declaration (after applying
//! accumulated `shift_detectors` offsets) names its tag:
//!
//! ```text
//! 0=RedX  1=GreenX  2=BlueX  3=RedZ  4=GreenZ  5=BlueZ  -1=ignored
//! ```
//!
//! While walking, the doubled detector declarations of the mobius model can
//! optionally be emitted, with a trailing coordinate recording which
//! two-color subgraph each copy lives in.

use crate::dem::{accumulate_coord_shift, DemInstruction, DetectorErrorModel};
use crate::error::ConfigError;
use crate::types::{Basis, Charge, ColorBasis, SubGraphCoord};

/// Collects color/basis data for all detectors in the model.
///
/// When `out_mobius_dem` is supplied, two coordinate-annotated detector
/// declarations are appended to it for every non-ignored detector.
pub fn collect_nodes_from_dem(
    dem: &DetectorErrorModel,
    mut out_mobius_dem: Option<&mut DetectorErrorModel>,
) -> Result<Vec<ColorBasis>, ConfigError> {
    let num_detectors = dem.count_detectors() as usize;
    let mut result = vec![ColorBasis::default(); num_detectors];
    let mut det_offset = 0u64;
    let mut coord_offsets: Vec<f64> = Vec::new();
    let mut coord_buffer: Vec<f64> = Vec::new();
    collect_nodes_helper(
        dem,
        &mut det_offset,
        &mut coord_offsets,
        &mut coord_buffer,
        &mut result,
        out_mobius_dem.as_deref_mut(),
    )?;
    Ok(result)
}

fn collect_nodes_helper(
    dem: &DetectorErrorModel,
    det_offset: &mut u64,
    coord_offsets: &mut Vec<f64>,
    coord_buffer: &mut Vec<f64>,
    out_node_color: &mut [ColorBasis],
    mut out_mobius_dem: Option<&mut DetectorErrorModel>,
) -> Result<(), ConfigError> {
    for inst in &dem.instructions {
        match inst {
            DemInstruction::Detector { coords, targets } => {
                process_detector_instruction(
                    coords,
                    targets,
                    coord_offsets,
                    *det_offset,
                    coord_buffer,
                    out_node_color,
                    out_mobius_dem.as_deref_mut(),
                )?;
            }
            DemInstruction::ShiftDetectors { coords, detectors } => {
                *det_offset += detectors;
                accumulate_coord_shift(coord_offsets, coords);
            }
            DemInstruction::Repeat { repetitions, block } => {
                for _ in 0..*repetitions {
                    collect_nodes_helper(
                        block,
                        det_offset,
                        coord_offsets,
                        coord_buffer,
                        out_node_color,
                        out_mobius_dem.as_deref_mut(),
                    )?;
                }
            }
            DemInstruction::Error { .. } | DemInstruction::LogicalObservable { .. } => {}
        }
    }
    Ok(())
}

/// Resolves the annotation of one detector declaration, writing color data
/// and optionally appending mobius detector declarations.
fn process_detector_instruction(
    coords: &[f64],
    targets: &[u64],
    coord_offsets: &[f64],
    det_offset: u64,
    coord_buffer: &mut Vec<f64>,
    out_node_color: &mut [ColorBasis],
    mut out_mobius_dem: Option<&mut DetectorErrorModel>,
) -> Result<(), ConfigError> {
    let cb = resolve_color_basis(coords, coord_offsets, targets)?;

    for &t in targets {
        let n = (t + det_offset) as usize;
        out_node_color[n] = cb;

        if cb.ignored {
            continue;
        }
        if let Some(mobius) = out_mobius_dem.as_deref_mut() {
            let (g0, g1) = match cb.color {
                Charge::R => (SubGraphCoord::NotGreen, SubGraphCoord::NotBlue),
                Charge::G => (SubGraphCoord::NotRed, SubGraphCoord::NotBlue),
                Charge::B => (SubGraphCoord::NotRed, SubGraphCoord::NotGreen),
                Charge::Neutral => unreachable!("resolved annotations are colored"),
            };

            coord_buffer.clear();
            coord_buffer.extend_from_slice(coords);
            for (k, off) in coord_offsets.iter().enumerate() {
                if k < coord_buffer.len() {
                    coord_buffer[k] += off;
                }
            }
            coord_buffer.push(f64::from(g0 as u8));
            let n = (t + det_offset) * 2;
            mobius.append_detector_instruction(coord_buffer.clone(), n);
            coord_buffer.pop();
            coord_buffer.push(f64::from(g1 as u8));
            mobius.append_detector_instruction(coord_buffer.clone(), n + 1);
        }
    }
    Ok(())
}

/// Maps a detector declaration's (shifted) 4th coordinate to a [`ColorBasis`].
pub fn resolve_color_basis(
    coords: &[f64],
    coord_offsets: &[f64],
    targets: &[u64],
) -> Result<ColorBasis, ConfigError> {
    let mut c = None;
    if coords.len() > 3 {
        let mut v = coords[3];
        if coord_offsets.len() > 3 {
            v += coord_offsets[3];
        }
        if (-1.0..=5.0).contains(&v) && v.fract() == 0.0 {
            c = Some(v as i32);
        }
    }
    let annotation_error = || {
        let mut msg = String::from(
            "Expected all detectors to have at least 4 coordinates, with the 4th \
             identifying the basis and color \
             (RedX=0, GreenX=1, BlueX=2, RedZ=3, GreenZ=4, BlueZ=5, ignored=-1), but got 'detector",
        );
        if !coords.is_empty() {
            msg.push('(');
            for (k, v) in coords.iter().enumerate() {
                if k > 0 {
                    msg.push_str(", ");
                }
                msg.push_str(&v.to_string());
            }
            msg.push(')');
        }
        for t in targets {
            msg.push_str(&format!(" D{}", t));
        }
        msg.push('\'');
        ConfigError::InvalidColorAnnotation(msg)
    };
    let r = c.ok_or_else(annotation_error)?;
    Ok(match r {
        -1 => ColorBasis::new_ignored(),
        0 => ColorBasis::new(Charge::R, Basis::X),
        1 => ColorBasis::new(Charge::G, Basis::X),
        2 => ColorBasis::new(Charge::B, Basis::X),
        3 => ColorBasis::new(Charge::R, Basis::Z),
        4 => ColorBasis::new(Charge::G, Basis::Z),
        5 => ColorBasis::new(Charge::B, Basis::Z),
        _ => unreachable!("range checked above"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_all_six_tags_and_ignored() {
        let dem: DetectorErrorModel = "
            detector(0, 0, 0, 0) D0
            detector(0, 0, 0, 1) D1
            detector(0, 0, 0, 2) D2
            detector(0, 0, 0, 3) D3
            detector(0, 0, 0, 4) D4
            detector(0, 0, 0, 5) D5
            detector(0, 0, 0, -1) D6
        "
        .parse()
        .unwrap();
        let colors = collect_nodes_from_dem(&dem, None).unwrap();
        assert_eq!(
            colors,
            vec![
                ColorBasis::new(Charge::R, Basis::X),
                ColorBasis::new(Charge::G, Basis::X),
                ColorBasis::new(Charge::B, Basis::X),
                ColorBasis::new(Charge::R, Basis::Z),
                ColorBasis::new(Charge::G, Basis::Z),
                ColorBasis::new(Charge::B, Basis::Z),
                ColorBasis::new_ignored(),
            ]
        );
    }

    #[test]
    fn shift_applies_to_fourth_coordinate_and_indexing() {
        let dem: DetectorErrorModel = "
            detector(0, 0, 0, 0) D0
            repeat 2 {
                detector(0, 0, 0, 4) D1
                shift_detectors(0, 0, 0, 1) 1
            }
        "
        .parse()
        .unwrap();
        let colors = collect_nodes_from_dem(&dem, None).unwrap();
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], ColorBasis::new(Charge::R, Basis::X));
        // First iteration: tag 4 (GreenZ) at detector 1.
        assert_eq!(colors[1], ColorBasis::new(Charge::G, Basis::Z));
        // Second iteration: tag 4+1=5 (BlueZ) at detector 2.
        assert_eq!(colors[2], ColorBasis::new(Charge::B, Basis::Z));
    }

    #[test]
    fn missing_or_fractional_annotation_fails() {
        let dem: DetectorErrorModel = "detector D0".parse().unwrap();
        assert!(matches!(
            collect_nodes_from_dem(&dem, None),
            Err(ConfigError::InvalidColorAnnotation(_))
        ));

        let dem: DetectorErrorModel = "detector(0, 0, 0, 2.5) D0".parse().unwrap();
        assert!(matches!(
            collect_nodes_from_dem(&dem, None),
            Err(ConfigError::InvalidColorAnnotation(_))
        ));

        let dem: DetectorErrorModel = "detector(0, 0, 0, 6) D0".parse().unwrap();
        assert!(matches!(
            collect_nodes_from_dem(&dem, None),
            Err(ConfigError::InvalidColorAnnotation(_))
        ));
    }

    #[test]
    fn emits_doubled_detectors_with_subgraph_coordinate() {
        let dem: DetectorErrorModel = "
            detector(1, 2, 0, 0) D0
            detector(1, 2, 0, -1) D1
            detector(3, 4, 0, 2) D2
        "
        .parse()
        .unwrap();
        let mut mobius = DetectorErrorModel::new();
        collect_nodes_from_dem(&dem, Some(&mut mobius)).unwrap();
        let expected: DetectorErrorModel = "
            detector(1, 2, 0, 0, 2) D0
            detector(1, 2, 0, 0, 3) D1
            detector(3, 4, 0, 2, 1) D4
            detector(3, 4, 0, 2, 2) D5
        "
        .parse()
        .unwrap();
        assert_eq!(mobius, expected);
    }
}
