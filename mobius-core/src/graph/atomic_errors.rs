//! Finds the atomic errors declared directly by the model.
//!
//! Every flattened error whose surviving symptom set has weight 1, 2, or 3
//! and satisfies the atomic invariants (single basis, neutral charge when
//! weight 3) is recorded. These entries seed the composite decomposition.

use std::collections::BTreeMap;

use crate::dem::{DemTarget, DetectorErrorModel};
use crate::error::ConfigError;
use crate::types::{
    AtomicErrorKey, Charge, ColorBasis, NodeOffset, ObsMask, SparseXorVec, BOUNDARY_NODE,
};

/// Converts one flattened error instruction into a detection event set and an
/// observable mask.
///
/// Duplicate detectors cancel; ignored detectors are dropped entirely.
pub fn extract_obs_and_dets_from_error_instruction(
    targets: &[DemTarget],
    node_colors: &[ColorBasis],
    out_xor_detectors: &mut SparseXorVec<NodeOffset>,
    out_obs_flip: &mut ObsMask,
) -> Result<(), ConfigError> {
    out_xor_detectors.clear();
    *out_obs_flip = 0;
    for t in targets {
        match t {
            DemTarget::Detector(u) => {
                if *u >= u64::from(BOUNDARY_NODE) {
                    return Err(ConfigError::DetectorIndexTooLarge(format!(
                        "The detector error model is too large. It has a detector with \
                         index {} but the max supported index is {}.",
                        u,
                        BOUNDARY_NODE - 1
                    )));
                }
                if !node_colors[*u as usize].ignored {
                    out_xor_detectors.xor_item(*u as NodeOffset);
                }
            }
            DemTarget::Observable(o) => {
                if u64::from(*o) >= ObsMask::BITS as u64 {
                    return Err(ConfigError::ObservableTooLarge(format!(
                        "Max logical observable is L{} but L{} appeared in an error instruction.",
                        ObsMask::BITS - 1,
                        o
                    )));
                }
                *out_obs_flip ^= (1 as ObsMask) << o;
            }
            DemTarget::Separator => {}
        }
    }
    Ok(())
}

/// Records the mask of a symptom set when it forms a valid atomic error.
/// Duplicate keys keep the mask written last.
fn record_if_atomic(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    out: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) {
    match dets.len() {
        1 => {
            out.insert(AtomicErrorKey::new(dets[0], BOUNDARY_NODE, BOUNDARY_NODE), obs_flip);
        }
        2 => {
            let c0 = node_colors[dets[0] as usize];
            let c1 = node_colors[dets[1] as usize];
            if c0.basis == c1.basis {
                out.insert(AtomicErrorKey::new(dets[0], dets[1], BOUNDARY_NODE), obs_flip);
            }
        }
        3 => {
            let c0 = node_colors[dets[0] as usize];
            let c1 = node_colors[dets[1] as usize];
            let c2 = node_colors[dets[2] as usize];
            let net_charge = c0.color ^ c1.color ^ c2.color;
            if net_charge == Charge::Neutral && c0.basis == c1.basis && c1.basis == c2.basis {
                out.insert(AtomicErrorKey::new(dets[0], dets[1], dets[2]), obs_flip);
            }
        }
        _ => {}
    }
}

/// Walks the model and collects every directly-declared atomic error.
pub fn collect_atomic_errors(
    dem: &DetectorErrorModel,
    node_colors: &[ColorBasis],
) -> Result<BTreeMap<AtomicErrorKey, ObsMask>, ConfigError> {
    let mut dets = SparseXorVec::new();
    let mut obs_flip: ObsMask = 0;
    let mut result = BTreeMap::new();
    let mut first_err: Option<ConfigError> = None;

    dem.for_each_flattened_error(&mut |_, targets| {
        if first_err.is_some() {
            return;
        }
        match extract_obs_and_dets_from_error_instruction(
            targets,
            node_colors,
            &mut dets,
            &mut obs_flip,
        ) {
            Ok(()) => record_if_atomic(dets.items(), obs_flip, node_colors, &mut result),
            Err(e) => first_err = Some(e),
        }
    });

    match first_err {
        Some(e) => Err(e),
        None => Ok(result),
    }
}
