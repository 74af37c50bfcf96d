//! Rewrites every model error as a sum of atomic errors, emitting the
//! two-body (mobius) error instructions that the matcher consumes.
//!
//! Each error's symptoms are split by basis and each side is decomposed
//! independently with a best-of search over split shapes:
//!
//! ```text
//! n=1..3  the whole set, if already atomic
//! n=2     1:1 splits
//! n=3     1:2 splits
//! n=4     2:2 splits, then 1:3 splits
//! n=5     2:3 splits
//! n=6     3:3 splits
//! ```
//!
//! A candidate split scores `[first known] + 2*[second known]`. When exactly
//! one side is known, the unknown side is recorded as a *remnant* whose mask
//! is forced by the known side; remnants are merged into the atomic table
//! before the lifting structures are built.

use std::collections::{BTreeMap, BTreeSet};

use crate::dem::{DemTarget, DetectorErrorModel};
use crate::error::ConfigError;
use crate::graph::atomic_errors::extract_obs_and_dets_from_error_instruction;
use crate::types::{
    AtomicErrorKey, Basis, Charge, ColorBasis, NodeOffset, ObsMask, SparseXorVec, BOUNDARY_NODE,
};

/// Builds the key of the symptoms not picked by a split, preserving order.
fn residual_key(dets: &[NodeOffset], picked: &[usize]) -> AtomicErrorKey {
    let mut rem = [BOUNDARY_NODE; 3];
    let mut w = 0usize;
    for (k, &d) in dets.iter().enumerate() {
        if !picked.contains(&k) {
            debug_assert!(w < 3);
            rem[w] = d;
            w += 1;
        }
    }
    AtomicErrorKey::new(rem[0], rem[1], rem[2])
}

/// Scores the candidate split `(e1, e2)` and keeps it when it beats the best
/// split seen so far. Unknown triplets with net charge are never acceptable.
fn try_grow_decomposition(
    e1: AtomicErrorKey,
    e2: AtomicErrorKey,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    best_score: &mut i32,
) {
    let c1 = atomic_errors.contains_key(&e1);
    let c2 = atomic_errors.contains_key(&e2);
    let score = i32::from(c1) + 2 * i32::from(c2);
    if score <= *best_score {
        return;
    }
    if score == 1 && e2.weight() == 3 && e2.net_charge(node_colors) != Charge::Neutral {
        return;
    }
    if score == 2 && e1.weight() == 3 && e1.net_charge(node_colors) != Charge::Neutral {
        return;
    }

    if *best_score > 0 {
        out_atoms.pop();
        out_atoms.pop();
    }
    out_atoms.push(e1);
    out_atoms.push(e2);
    *best_score = score;
}

/// Finalizes a best-of search: records the remnant (if any) and reports
/// whether any split was accepted.
fn try_finish_decomposition(
    best_score: i32,
    obs_flip: ObsMask,
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut [AtomicErrorKey],
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    debug_assert!(best_score == 0 || out_atoms.len() >= 2);
    if best_score == 1 {
        let cur = out_atoms[out_atoms.len() - 2];
        let rem = out_atoms[out_atoms.len() - 1];
        out_remnants.insert(rem, obs_flip ^ atomic_errors[&cur]);
    } else if best_score == 2 {
        let cur = out_atoms[out_atoms.len() - 1];
        let rem = out_atoms[out_atoms.len() - 2];
        out_remnants.insert(rem, obs_flip ^ atomic_errors[&cur]);
    }
    best_score > 0
}

fn helper_n2(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    // Check if it's just directly included.
    let e = AtomicErrorKey::new(dets[0], dets[1], BOUNDARY_NODE);
    if atomic_errors.contains_key(&e) {
        out_atoms.push(e);
        return true;
    }

    let mut best_score = 0;

    // 1:1 decomposition.
    for k1 in 0..dets.len() {
        try_grow_decomposition(
            AtomicErrorKey::new(dets[k1], BOUNDARY_NODE, BOUNDARY_NODE),
            residual_key(dets, &[k1]),
            node_colors,
            atomic_errors,
            out_atoms,
            &mut best_score,
        );
    }

    try_finish_decomposition(best_score, obs_flip, atomic_errors, out_atoms, out_remnants)
}

fn helper_n3(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    // Check if it's just directly included.
    let e = AtomicErrorKey::new(dets[0], dets[1], dets[2]);
    if atomic_errors.contains_key(&e) {
        out_atoms.push(e);
        return true;
    }

    let mut best_score = 0;

    // 1:2 decomposition.
    for k1 in 0..dets.len() {
        try_grow_decomposition(
            AtomicErrorKey::new(dets[k1], BOUNDARY_NODE, BOUNDARY_NODE),
            residual_key(dets, &[k1]),
            node_colors,
            atomic_errors,
            out_atoms,
            &mut best_score,
        );
    }

    try_finish_decomposition(best_score, obs_flip, atomic_errors, out_atoms, out_remnants)
}

fn helper_n4(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    let mut best_score = 0;

    // 2:2 decomposition.
    for k1 in 0..dets.len() {
        if best_score >= 2 {
            break;
        }
        for k2 in k1 + 1..dets.len() {
            try_grow_decomposition(
                AtomicErrorKey::new(dets[k1], dets[k2], BOUNDARY_NODE),
                residual_key(dets, &[k1, k2]),
                node_colors,
                atomic_errors,
                out_atoms,
                &mut best_score,
            );
        }
    }

    // 1:3 decomposition.
    for k1 in 0..dets.len() {
        try_grow_decomposition(
            AtomicErrorKey::new(dets[k1], BOUNDARY_NODE, BOUNDARY_NODE),
            residual_key(dets, &[k1]),
            node_colors,
            atomic_errors,
            out_atoms,
            &mut best_score,
        );
    }

    try_finish_decomposition(best_score, obs_flip, atomic_errors, out_atoms, out_remnants)
}

fn helper_n5(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    let mut best_score = 0;

    // 2:3 decomposition.
    for k1 in 0..dets.len() {
        if best_score >= 2 {
            break;
        }
        for k2 in k1 + 1..dets.len() {
            try_grow_decomposition(
                AtomicErrorKey::new(dets[k1], dets[k2], BOUNDARY_NODE),
                residual_key(dets, &[k1, k2]),
                node_colors,
                atomic_errors,
                out_atoms,
                &mut best_score,
            );
        }
    }

    try_finish_decomposition(best_score, obs_flip, atomic_errors, out_atoms, out_remnants)
}

fn helper_n6(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    let mut best_score = 0;

    // 3:3 decomposition.
    for k1 in 0..dets.len() {
        if best_score >= 2 {
            break;
        }
        for k2 in k1 + 1..dets.len() {
            for k3 in k2 + 1..dets.len() {
                try_grow_decomposition(
                    AtomicErrorKey::new(dets[k1], dets[k2], dets[k3]),
                    residual_key(dets, &[k1, k2, k3]),
                    node_colors,
                    atomic_errors,
                    out_atoms,
                    &mut best_score,
                );
            }
        }
    }

    try_finish_decomposition(best_score, obs_flip, atomic_errors, out_atoms, out_remnants)
}

/// Decomposes a single-basis symptom set into atomic pieces.
///
/// Returns false when no decomposition was found (sets larger than six
/// symptoms are never decomposable).
pub fn decompose_single_basis_dets_into_atoms(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> bool {
    match dets.len() {
        0 => true,
        1 => {
            let e = AtomicErrorKey::new(dets[0], BOUNDARY_NODE, BOUNDARY_NODE);
            out_atoms.push(e);
            atomic_errors.contains_key(&e)
        }
        2 => helper_n2(dets, obs_flip, node_colors, atomic_errors, out_atoms, out_remnants),
        3 => helper_n3(dets, obs_flip, node_colors, atomic_errors, out_atoms, out_remnants),
        4 => helper_n4(dets, obs_flip, node_colors, atomic_errors, out_atoms, out_remnants),
        5 => helper_n5(dets, obs_flip, node_colors, atomic_errors, out_atoms, out_remnants),
        6 => helper_n6(dets, obs_flip, node_colors, atomic_errors, out_atoms, out_remnants),
        _ => false,
    }
}

fn format_flattened_error(probability: f64, targets: &[DemTarget]) -> String {
    let mut s = format!("error({})", probability);
    for t in targets {
        s.push(' ');
        s.push_str(&t.to_string());
    }
    s
}

/// Splits a symptom set by basis and decomposes each side independently.
///
/// Returns `Ok(true)` when both sides decomposed, `Ok(false)` when a side
/// failed but `ignore_decomposition_failures` allows dropping the error.
#[allow(clippy::too_many_arguments)]
pub fn decompose_dets_into_atoms(
    dets: &[NodeOffset],
    obs_flip: ObsMask,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    ignore_decomposition_failures: bool,
    buf_x_detectors: &mut Vec<NodeOffset>,
    buf_z_detectors: &mut Vec<NodeOffset>,
    instruction_for_error_message: &str,
    dem_for_error_message: &DetectorErrorModel,
    out_atoms: &mut Vec<AtomicErrorKey>,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> Result<bool, ConfigError> {
    // Split into X and Z parts.
    buf_x_detectors.clear();
    buf_z_detectors.clear();
    for &t in dets {
        let cb = node_colors[t as usize];
        if cb.color == Charge::Neutral || cb.basis == Basis::Unknown {
            return Err(ConfigError::InvalidColorAnnotation(format!(
                "Detector D{} originating from instruction (after shifting) '{}' is missing \
                 coordinate data indicating its color and basis.\n\
                 Every detector used in an error must have a 4th coordinate in [0,6) where \
                 RedX=0, GreenX=1, BlueX=2, RedZ=3, GreenZ=4, BlueZ=5.",
                t, instruction_for_error_message
            )));
        }
        if cb.basis == Basis::X {
            buf_x_detectors.push(t);
        } else {
            buf_z_detectors.push(t);
        }
    }

    // Split into atomic errors.
    out_atoms.clear();
    let x_worked = decompose_single_basis_dets_into_atoms(
        buf_x_detectors,
        obs_flip,
        node_colors,
        atomic_errors,
        out_atoms,
        out_remnants,
    );
    let z_worked = decompose_single_basis_dets_into_atoms(
        buf_z_detectors,
        obs_flip,
        node_colors,
        atomic_errors,
        out_atoms,
        out_remnants,
    );
    if x_worked && z_worked {
        return Ok(true);
    }
    if ignore_decomposition_failures {
        return Ok(false);
    }

    let mut msg = String::from("Failed to decompose a complex error instruction into basic errors.\n");
    msg.push_str(&format!(
        "    The instruction (after shifting): {}\n",
        instruction_for_error_message
    ));
    if !x_worked {
        msg.push_str(&format!(
            "    The undecomposed X detectors: {:?}\n",
            buf_x_detectors
        ));
    }
    if !z_worked {
        msg.push_str(&format!(
            "    The undecomposed Z detectors: {:?}\n",
            buf_z_detectors
        ));
    }
    msg.push_str("    Detector data:\n");
    let wanted: BTreeSet<u64> = dets.iter().map(|&d| u64::from(d)).collect();
    let coords = dem_for_error_message.detector_coordinates(&wanted);
    for &d in dets {
        msg.push_str(&format!(
            "        D{}: coords={:?} {}\n",
            d,
            coords.get(&u64::from(d)).cloned().unwrap_or_default(),
            node_colors[d as usize]
        ));
    }
    msg.push_str(
        "This problem can unfortunately be quite difficult to debug. Likely causes are:\n\
             (1) The source model has detectors with invalid color/basis annotations.\n\
             (2) The source model contains errors too complex to decompose (e.g. more than \
         6 symptoms in one basis).\n\
             (3) The decoder is missing logic for a corner case present in the source model.\n",
    );
    Err(ConfigError::DecompositionFailure(msg))
}

/// Decomposes every error in the model, appending the resulting two-body
/// error instructions to the mobius model and accumulating remnants.
#[allow(clippy::too_many_arguments)]
pub fn collect_composite_errors_and_remnants_into_mobius_dem(
    dem: &DetectorErrorModel,
    node_colors: &[ColorBasis],
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    drop_mobius_errors_involving_remnant_errors: bool,
    ignore_decomposition_failures: bool,
    out_mobius_dem: &mut DetectorErrorModel,
    out_remnants: &mut BTreeMap<AtomicErrorKey, ObsMask>,
) -> Result<(), ConfigError> {
    let mut dets = SparseXorVec::new();
    let mut obs_flip: ObsMask = 0;
    let mut x_buf: Vec<NodeOffset> = Vec::new();
    let mut z_buf: Vec<NodeOffset> = Vec::new();
    let mut atoms_buf: Vec<AtomicErrorKey> = Vec::new();
    let mut composite_error_buffer: Vec<DemTarget> = Vec::new();
    let mut first_err: Option<ConfigError> = None;

    dem.for_each_flattened_error(&mut |probability, targets| {
        if first_err.is_some() {
            return;
        }
        let step = (|| -> Result<(), ConfigError> {
            extract_obs_and_dets_from_error_instruction(
                targets,
                node_colors,
                &mut dets,
                &mut obs_flip,
            )?;

            let decomposed = decompose_dets_into_atoms(
                dets.items(),
                obs_flip,
                node_colors,
                atomic_errors,
                ignore_decomposition_failures,
                &mut x_buf,
                &mut z_buf,
                &format_flattened_error(probability, targets),
                dem,
                &mut atoms_buf,
                out_remnants,
            )?;
            if !decomposed {
                return Ok(());
            }

            composite_error_buffer.clear();
            let mut has_corner_error = false;
            let mut used_remnant = false;
            for atom in &atoms_buf {
                used_remnant |= !atomic_errors.contains_key(atom);
                has_corner_error |= atom.weight() == 1;
                atom.iter_mobius_edges(node_colors, |d1, d2| {
                    composite_error_buffer.push(DemTarget::Detector(d1));
                    composite_error_buffer.push(DemTarget::Detector(d2));
                    composite_error_buffer.push(DemTarget::Separator);
                });
            }
            if used_remnant && drop_mobius_errors_involving_remnant_errors {
                return Ok(());
            }
            if composite_error_buffer.is_empty() {
                return Ok(());
            }
            composite_error_buffer.pop();

            // A corner edge crosses between the two subgraphs, so its weight
            // has to be doubled by squaring the probability.
            let p = if has_corner_error {
                probability * probability
            } else {
                probability
            };
            out_mobius_dem.append_error_instruction(p, composite_error_buffer.clone());
            Ok(())
        })();
        if let Err(e) = step {
            first_err = Some(e);
        }
    });

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
