//! The pluggable matching capability and its default implementation.
//!
//! The decoder only needs two things from a matcher: configure a fresh
//! instance against a mobius model, and turn a sparse detection event list
//! into an interleaved list of matched edge endpoints. The default
//! implementation wraps the fusion-blossom serial MWPM solver.

use fusion_blossom::mwpm_solver::{PrimalDualSolver, SolverSerial};
use fusion_blossom::util::{SolverInitializer, SyndromePattern, VertexIndex, Weight};

use std::collections::BTreeMap;

use crate::dem::{DemTarget, DetectorErrorModel};
use crate::error::ConfigError;

/// The matching capability required by the decoder.
///
/// `match_edges` must fill `out_edge_buffer` with an interleaved endpoint
/// list (`out_edge_buffer[2k]`, `out_edge_buffer[2k+1]` form one edge) and no
/// boundary endpoints: the mobius model is guaranteed to contain none.
pub trait Matcher {
    /// Creates a new instance of the matcher, configured for the given
    /// mobius detector error model.
    fn configured_for_mobius_dem(
        &self,
        dem: &DetectorErrorModel,
    ) -> Result<Box<dyn Matcher>, ConfigError>;

    /// Matches the given detection events, producing edges.
    ///
    /// When `out_weight` is supplied it receives the unscaled total weight of
    /// the produced edges.
    fn match_edges(
        &mut self,
        detection_event_indices: &[u64],
        out_edge_buffer: &mut Vec<i64>,
        out_weight: Option<&mut f32>,
    );
}

/// Default matcher backed by the fusion-blossom serial MWPM solver.
///
/// A freshly constructed instance is an unconfigured factory; calling
/// [`Matcher::configured_for_mobius_dem`] produces a usable solver.
pub struct BlossomMatcher {
    solver: Option<SolverSerial>,
    /// Edge endpoints and unscaled log-odds weights, indexed like the
    /// solver's edge set.
    edges: Vec<(VertexIndex, VertexIndex, f64)>,
}

impl BlossomMatcher {
    /// Creates an unconfigured factory instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            solver: None,
            edges: Vec::new(),
        }
    }

    /// Builds a solver bound to the given mobius model.
    pub fn configured(dem: &DetectorErrorModel) -> Result<Self, ConfigError> {
        let vertex_num = dem.count_detectors();

        // Merge parallel edges by combining their firing probabilities.
        let mut edge_probs: BTreeMap<(u64, u64), f64> = BTreeMap::new();
        let mut component: Vec<u64> = Vec::new();
        dem.for_each_flattened_error(&mut |p, targets| {
            component.clear();
            for t in targets.iter().chain(std::iter::once(&DemTarget::Separator)) {
                match t {
                    DemTarget::Detector(d) => component.push(*d),
                    DemTarget::Separator => {
                        debug_assert_eq!(component.len(), 2, "mobius errors are edge-like");
                        if component.len() == 2 {
                            let key = if component[0] <= component[1] {
                                (component[0], component[1])
                            } else {
                                (component[1], component[0])
                            };
                            let q = edge_probs.entry(key).or_insert(0.0);
                            *q = *q * (1.0 - p) + p * (1.0 - *q);
                        }
                        component.clear();
                    }
                    DemTarget::Observable(_) => {}
                }
            }
        });

        // Weight formula: ln((1-p)/p), scaled to even non-negative integers
        // as the solver requires.
        let mut edges = Vec::with_capacity(edge_probs.len());
        let mut weighted_edges: Vec<(VertexIndex, VertexIndex, Weight)> =
            Vec::with_capacity(edge_probs.len());
        for (&(a, b), &p) in &edge_probs {
            let p = p.clamp(1e-10, 1.0 - 1e-10);
            let w = ((1.0 - p) / p).ln();
            let scaled = (((w * 500.0) as Weight) * 2).max(0);
            edges.push((a as VertexIndex, b as VertexIndex, w));
            weighted_edges.push((a as VertexIndex, b as VertexIndex, scaled));
        }

        let initializer = SolverInitializer::new(vertex_num as VertexIndex, weighted_edges, Vec::new());
        Ok(Self {
            solver: Some(SolverSerial::new(&initializer)),
            edges,
        })
    }
}

impl Default for BlossomMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher for BlossomMatcher {
    fn configured_for_mobius_dem(
        &self,
        dem: &DetectorErrorModel,
    ) -> Result<Box<dyn Matcher>, ConfigError> {
        Ok(Box::new(Self::configured(dem)?))
    }

    fn match_edges(
        &mut self,
        detection_event_indices: &[u64],
        out_edge_buffer: &mut Vec<i64>,
        mut out_weight: Option<&mut f32>,
    ) {
        out_edge_buffer.clear();
        if let Some(w) = out_weight.as_deref_mut() {
            *w = 0.0;
        }
        let solver = match &mut self.solver {
            Some(s) => s,
            None => {
                debug_assert!(false, "match_edges called on an unconfigured matcher");
                return;
            }
        };
        if detection_event_indices.is_empty() {
            return;
        }

        let defects: Vec<VertexIndex> = detection_event_indices
            .iter()
            .map(|&d| d as VertexIndex)
            .collect();
        let pattern = SyndromePattern::new_vertices(defects);
        solver.solve(&pattern);
        let mut total = 0.0f64;
        for edge_index in solver.subgraph() {
            let (a, b, w) = self.edges[edge_index as usize];
            out_edge_buffer.push(a as i64);
            out_edge_buffer.push(b as i64);
            total += w;
        }
        solver.clear();
        if let Some(w) = out_weight {
            *w = total as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_two_isolated_events_through_their_edge() {
        // Mobius model with a single edge between doubled detectors 0 and 1.
        let dem: DetectorErrorModel = "
            error(0.1) D0 D1
            detector D3
        "
        .parse()
        .unwrap();
        let mut matcher = BlossomMatcher::configured(&dem).unwrap();
        let mut edges = Vec::new();
        matcher.match_edges(&[0, 1], &mut edges, None);
        assert_eq!(edges, vec![0, 1]);
    }

    #[test]
    fn prefers_cheap_paths() {
        // Chain 0-1-2-3 with a cheap middle edge and an expensive shortcut.
        let dem: DetectorErrorModel = "
            error(0.3) D0 D1
            error(0.3) D2 D3
            error(0.001) D0 D3
            detector D3
        "
        .parse()
        .unwrap();
        let mut matcher = BlossomMatcher::configured(&dem).unwrap();
        let mut edges = Vec::new();
        matcher.match_edges(&[0, 1, 2, 3], &mut edges, None);
        // The two likely edges are used rather than the unlikely shortcut.
        let mut pairs: Vec<(i64, i64)> = edges
            .chunks_exact(2)
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn empty_event_list_matches_nothing() {
        let dem: DetectorErrorModel = "error(0.1) D0 D1".parse().unwrap();
        let mut matcher = BlossomMatcher::configured(&dem).unwrap();
        let mut edges = vec![1, 2, 3];
        matcher.match_edges(&[], &mut edges, None);
        assert!(edges.is_empty());
    }
}
