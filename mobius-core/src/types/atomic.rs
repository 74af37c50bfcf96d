//! Atomic errors: the building blocks all other errors decompose into.
//!
//! There are four kinds of atomic error:
//!
//! - **Neutral triplet**: three detection events, one of each color.
//!   Example: a bulk error in a code capacity color code.
//! - **Neutral pair**: two detection events of the same color.
//!   Example: a measurement error in a phenomenological color code.
//! - **Charged pair**: two detection events of different colors.
//!   Example: a boundary error in a code capacity color code.
//! - **Charged singlet**: one detection event.
//!   Example: a corner error in a code capacity color code.
//!
//! Key invariants:
//!
//! ```text
//! sorted:          dets[0] <= dets[1] <= dets[2] <= BOUNDARY_NODE
//! not empty:       dets[0] != BOUNDARY_NODE
//! neutral triplet: dets[2] != BOUNDARY_NODE  ==>  net charge == NEUTRAL
//! single basis:    all real dets share one basis
//! ```

use std::fmt;

use super::charge::{
    Charge, ColorBasis, NodeOffset, BOUNDARY_NODE, SUBGRAPH_OFFSET_BLUE_NOT_GREEN,
    SUBGRAPH_OFFSET_BLUE_NOT_RED, SUBGRAPH_OFFSET_GREEN_NOT_BLUE, SUBGRAPH_OFFSET_GREEN_NOT_RED,
    SUBGRAPH_OFFSET_RED_NOT_BLUE, SUBGRAPH_OFFSET_RED_NOT_GREEN,
};

/// Branchless compare-and-swap putting the smaller value first.
#[inline(always)]
pub fn inplace_sort2(a: &mut NodeOffset, b: &mut NodeOffset) {
    let cmp = (*a > *b) as NodeOffset;
    let mask = cmp.wrapping_neg() & (*a ^ *b);
    *a ^= mask;
    *b ^= mask;
}

/// Returns the three values in non-decreasing order.
#[inline(always)]
#[must_use]
pub fn sort3(mut a: NodeOffset, mut b: NodeOffset, mut c: NodeOffset) -> [NodeOffset; 3] {
    inplace_sort2(&mut b, &mut c);
    inplace_sort2(&mut a, &mut b);
    inplace_sort2(&mut b, &mut c);
    [a, b, c]
}

/// Canonical key of an atomic error: its sorted symptom triple, padded on the
/// right with [`BOUNDARY_NODE`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct AtomicErrorKey {
    /// Sorted symptoms, padded with `BOUNDARY_NODE`.
    pub dets: [NodeOffset; 3],
}

impl AtomicErrorKey {
    /// Builds the canonical key for up to three symptoms.
    #[inline]
    #[must_use]
    pub fn new(det1: NodeOffset, det2: NodeOffset, det3: NodeOffset) -> Self {
        Self {
            dets: sort3(det1, det2, det3),
        }
    }

    /// Builds the canonical key from a symptom slice of length at most 3.
    #[must_use]
    pub fn from_dets(dets: &[NodeOffset]) -> Self {
        debug_assert!(dets.len() <= 3);
        Self::new(
            dets.first().copied().unwrap_or(BOUNDARY_NODE),
            dets.get(1).copied().unwrap_or(BOUNDARY_NODE),
            dets.get(2).copied().unwrap_or(BOUNDARY_NODE),
        )
    }

    /// Number of real (non-boundary) symptoms.
    #[inline]
    #[must_use]
    pub fn weight(&self) -> u8 {
        self.dets.iter().map(|&d| u8::from(d != BOUNDARY_NODE)).sum()
    }

    /// XOR of the colors of the real symptoms.
    #[must_use]
    pub fn net_charge(&self, node_colors: &[ColorBasis]) -> Charge {
        let mut c = Charge::Neutral;
        for &d in &self.dets {
            if d != BOUNDARY_NODE {
                c ^= node_colors[d as usize].color;
            }
        }
        c
    }

    /// Expands the atomic error into edges of the mobius (doubled) graph.
    ///
    /// Each symptom splits into its two subgraph copies, and the copies pair
    /// up so that each edge stays inside a single two-color subgraph. The
    /// pairing controls how the subgraphs connect to each other, which is
    /// what lets the matcher move charge between them.
    pub fn iter_mobius_edges<F: FnMut(u64, u64)>(
        &self,
        node_colors: &[ColorBasis],
        mut callback: F,
    ) {
        let [n1, n2, n3] = self.dets;
        if n1 == BOUNDARY_NODE {
            // No edge.
        } else if n2 == BOUNDARY_NODE {
            // Corner piece: the node's two copies bounce off each other.
            callback(u64::from(n1) * 2, u64::from(n1) * 2 + 1);
        } else if n3 == BOUNDARY_NODE {
            let c1 = node_colors[n1 as usize].color;
            let c2 = node_colors[n2 as usize].color;
            let flip_order = u64::from((c1 ^ c2) == Charge::G);
            callback(u64::from(n1) * 2, (u64::from(n2) * 2) ^ flip_order);
            callback(u64::from(n1) * 2 + 1, (u64::from(n2) * 2 + 1) ^ flip_order);
        } else {
            debug_assert_eq!(self.net_charge(node_colors), Charge::Neutral);
            let mut rgb = [BOUNDARY_NODE; 3];
            for &n in &self.dets {
                rgb[node_colors[n as usize].color as usize - 1] = n;
            }
            let [r, g, b] = rgb;
            debug_assert!(r != BOUNDARY_NODE && g != BOUNDARY_NODE && b != BOUNDARY_NODE);
            let mut a0 = u64::from(r) * 2 + u64::from(SUBGRAPH_OFFSET_RED_NOT_BLUE);
            let mut b0 = u64::from(g) * 2 + u64::from(SUBGRAPH_OFFSET_GREEN_NOT_BLUE);
            let mut a1 = u64::from(g) * 2 + u64::from(SUBGRAPH_OFFSET_GREEN_NOT_RED);
            let mut b1 = u64::from(b) * 2 + u64::from(SUBGRAPH_OFFSET_BLUE_NOT_RED);
            let mut a2 = u64::from(r) * 2 + u64::from(SUBGRAPH_OFFSET_RED_NOT_GREEN);
            let mut b2 = u64::from(b) * 2 + u64::from(SUBGRAPH_OFFSET_BLUE_NOT_GREEN);
            sort2_u64(&mut a0, &mut b0);
            sort2_u64(&mut a1, &mut b1);
            sort2_u64(&mut a2, &mut b2);
            callback(a0, b0);
            callback(a1, b1);
            callback(a2, b2);
        }
    }
}

#[inline(always)]
fn sort2_u64(a: &mut u64, b: &mut u64) {
    if a > b {
        std::mem::swap(a, b);
    }
}

impl fmt::Display for AtomicErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicErrorKey{{")?;
        for (k, &d) in self.dets.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            if d == BOUNDARY_NODE {
                write!(f, "BOUNDARY")?;
            } else {
                write!(f, "D{}", d)?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::charge::Basis;

    fn colors(tags: &[Charge]) -> Vec<ColorBasis> {
        tags.iter()
            .map(|&c| ColorBasis::new(c, Basis::X))
            .collect()
    }

    #[test]
    fn sort3_orders_every_permutation() {
        let expected = [1, 5, 9];
        for [a, b, c] in [
            [1, 5, 9],
            [1, 9, 5],
            [5, 1, 9],
            [5, 9, 1],
            [9, 1, 5],
            [9, 5, 1],
        ] {
            assert_eq!(sort3(a, b, c), expected);
        }
    }

    #[test]
    fn key_is_permutation_invariant() {
        let base = AtomicErrorKey::new(3, 1, 2);
        assert_eq!(AtomicErrorKey::new(1, 2, 3), base);
        assert_eq!(AtomicErrorKey::new(2, 3, 1), base);
        assert_eq!(AtomicErrorKey::from_dets(&[3, 2, 1]), base);
        assert_eq!(base.dets, [1, 2, 3]);
    }

    #[test]
    fn weight_counts_real_symptoms() {
        assert_eq!(AtomicErrorKey::new(4, BOUNDARY_NODE, BOUNDARY_NODE).weight(), 1);
        assert_eq!(AtomicErrorKey::new(4, 7, BOUNDARY_NODE).weight(), 2);
        assert_eq!(AtomicErrorKey::new(4, 7, 9).weight(), 3);
    }

    #[test]
    fn singlet_mobius_edges() {
        let cs = colors(&[Charge::R]);
        let mut edges = Vec::new();
        AtomicErrorKey::new(0, BOUNDARY_NODE, BOUNDARY_NODE)
            .iter_mobius_edges(&cs, |a, b| edges.push((a, b)));
        assert_eq!(edges, vec![(0, 1)]);
    }

    #[test]
    fn same_color_pair_mobius_edges() {
        // Detectors 0 and 3 both red.
        let cs = colors(&[Charge::R, Charge::B, Charge::G, Charge::R]);
        let mut edges = Vec::new();
        AtomicErrorKey::new(0, 3, BOUNDARY_NODE).iter_mobius_edges(&cs, |a, b| edges.push((a, b)));
        assert_eq!(edges, vec![(0, 6), (1, 7)]);
    }

    #[test]
    fn cross_color_pair_mobius_edges() {
        // Red-green pair: R^G == B, so no swap.
        let cs = colors(&[Charge::R, Charge::G]);
        let mut edges = Vec::new();
        AtomicErrorKey::new(0, 1, BOUNDARY_NODE).iter_mobius_edges(&cs, |a, b| edges.push((a, b)));
        assert_eq!(edges, vec![(0, 2), (1, 3)]);

        // Red-blue pair: R^B == G, so the second node's copies swap.
        let cs = colors(&[Charge::R, Charge::B]);
        let mut edges = Vec::new();
        AtomicErrorKey::new(0, 1, BOUNDARY_NODE).iter_mobius_edges(&cs, |a, b| edges.push((a, b)));
        assert_eq!(edges, vec![(0, 3), (1, 2)]);
    }

    #[test]
    fn triplet_mobius_edges_cover_each_subgraph() {
        let cs = colors(&[Charge::R, Charge::G, Charge::B]);
        let mut edges = Vec::new();
        AtomicErrorKey::new(0, 1, 2).iter_mobius_edges(&cs, |a, b| edges.push((a, b)));
        // NotBlue: R(D0 offset 1) -- G(D1 offset 1); NotRed: G(D1 offset 0) --
        // B(D2 offset 0); NotGreen: R(D0 offset 0) -- B(D2 offset 1).
        assert_eq!(edges, vec![(1, 3), (2, 4), (0, 5)]);
    }
}
