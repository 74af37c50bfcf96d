//! Chooses a representative color triangle for every detector.
//!
//! During lifting, charge parked near a detector is stored on a nearby node
//! of the matching color. The representative triangle of a detector names
//! those nearby nodes, one per color, along with the observable cost of the
//! underlying error.

use std::collections::BTreeMap;

use crate::types::{AtomicErrorKey, ColorBasis, ObsMask, RgbEdge, BOUNDARY_NODE};

/// Picks each detector's representative triangle from the atomic error set.
#[must_use]
pub fn choose_rgb_reps_from_atomic_errors(
    atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
    node_colors: &[ColorBasis],
) -> Vec<RgbEdge> {
    let mut result = vec![RgbEdge::default(); node_colors.len()];

    // Assign node representatives from the highest weight RGB edges they are
    // part of.
    for (err, &obs_flip) in atomic_errors {
        let mut rep = RgbEdge {
            obs_flip,
            ..RgbEdge::default()
        };
        let mut weight = 0usize;
        for &n in &err.dets {
            if n != BOUNDARY_NODE {
                let cb = node_colors[n as usize];
                debug_assert!(!cb.ignored);
                *rep.color_node_mut(cb.color) = n;
                rep.charge_flip ^= cb.color;
                weight += 1;
            }
        }

        if rep.weight() != weight {
            // Color appeared more than once.
            continue;
        }

        for &n in &err.dets {
            if n != BOUNDARY_NODE && weight > result[n as usize].weight() {
                result[n as usize] = rep;
            }
        }
    }

    // In a phenom circuit, the final layer of stabilizer measurements has no
    // RGB errors. Detectors from that layer inherit the triangle of their
    // partner across a same-color (measurement) pair, rebinding the shared
    // color slot and absorbing the pair's observable mask.
    for (e, &obs_flip) in atomic_errors {
        if e.weight() != 2 {
            continue;
        }
        let a = e.dets[0] as usize;
        let b = e.dets[1] as usize;
        let c1 = node_colors[a].color;
        let c2 = node_colors[b].color;
        if c1 != c2 {
            continue;
        }
        let w1 = result[a].weight();
        let w2 = result[b].weight();
        if w1 == 0 && w2 > 0 {
            let mut r = result[b];
            debug_assert_eq!(r.color_node(c1), e.dets[1]);
            *r.color_node_mut(c1) = e.dets[0];
            r.obs_flip ^= obs_flip;
            result[a] = r;
        }
        if w2 == 0 && w1 > 0 {
            let mut r = result[a];
            debug_assert_eq!(r.color_node(c2), e.dets[0]);
            *r.color_node_mut(c2) = e.dets[1];
            r.obs_flip ^= obs_flip;
            result[b] = r;
        }
    }

    result
}
