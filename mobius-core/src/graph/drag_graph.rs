//! The drag graph: how to move charge between nodes, and at what cost.
//!
//! When dragging charge around, the charge is always kept near the current
//! target node `T`. Charge of `T`'s own color is exactly a detection event at
//! `T`; charge of another color is kept on that color's representative near
//! `T`. When no node of a color exists near `T`, charge of that color has to
//! be split across the other two colors to be stored, which is what the
//! boundary-dumping and triangle-rotation entries encode.
//!
//! Entries are always inserted symmetrically: `(n1->n2, c1->c2)` and
//! `(n2->n1, c2->c1)` carry the same observable mask.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::graph::charge_graph::ChargeGraph;
use crate::types::{
    AtomicErrorKey, Charge, ColorBasis, NodeOffset, ObsMask, RgbEdge, BOUNDARY_NODE,
};

/// A directed charge movement between two nodes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ChargedEdge {
    /// Source node.
    pub n1: NodeOffset,
    /// Destination node.
    pub n2: NodeOffset,
    /// Charge held at the source.
    pub c1: Charge,
    /// Charge held at the destination.
    pub c2: Charge,
}

/// Table of legal charge movements and their observable costs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragGraph {
    /// `(n1, n2, c1, c2) -> observable flip`.
    pub moves: BTreeMap<ChargedEdge, ObsMask>,
}

/// Shortest-path searcher over the charge graph bulk.
///
/// The visited buffer is tagged with a per-query counter instead of being
/// cleared between queries. The counter is 64-bit; a run never wraps it.
struct BfsSearcher {
    next_seen_tag: u64,
    node_seen_tags: Vec<u64>,
    cur_cost_stack: Vec<(NodeOffset, ObsMask)>,
    next_cost_stack: Vec<(NodeOffset, ObsMask)>,
}

impl BfsSearcher {
    fn new(num_nodes: usize) -> Self {
        Self {
            next_seen_tag: 1,
            node_seen_tags: vec![0; num_nodes],
            cur_cost_stack: Vec::new(),
            next_cost_stack: Vec::new(),
        }
    }

    /// Finds the observable flip of a path from `src` to `dst` of cost at
    /// most `max_cost`, searching only the bulk (boundary edges excluded).
    fn find_shortest_path_obs_flip(
        &mut self,
        graph: &ChargeGraph,
        src: NodeOffset,
        dst: NodeOffset,
        max_cost: usize,
    ) -> Option<ObsMask> {
        // Trivial case: same node.
        if src == dst {
            return Some(0);
        }

        // Trivial case: neighbor.
        if let Some(&m) = graph.nodes[src as usize].neighbors.get(&dst) {
            return Some(m);
        }

        let tag = self.next_seen_tag;
        self.next_seen_tag += 1;

        self.cur_cost_stack.clear();
        self.next_cost_stack.clear();
        self.cur_cost_stack.push((src, 0));
        let mut cur_cost = 0usize;
        loop {
            let (n, path_obs_flip) = match self.cur_cost_stack.pop() {
                Some(top) => top,
                None => {
                    std::mem::swap(&mut self.cur_cost_stack, &mut self.next_cost_stack);
                    cur_cost += 1;
                    if self.cur_cost_stack.is_empty() || cur_cost >= max_cost {
                        return None;
                    }
                    continue;
                }
            };

            for (&neighbor, &edge_obs_flip) in &graph.nodes[n as usize].neighbors {
                let new_path_flip = path_obs_flip ^ edge_obs_flip;
                if neighbor == dst {
                    return Some(new_path_flip);
                }
                if neighbor == BOUNDARY_NODE {
                    // We're only searching in the bulk.
                    continue;
                }
                if self.node_seen_tags[neighbor as usize] == tag {
                    continue;
                }
                self.node_seen_tags[neighbor as usize] = tag;
                self.next_cost_stack.push((neighbor, new_path_flip));
            }
        }
    }
}

impl DragGraph {
    /// Builds the drag table by walking the atomic errors and pathfinding
    /// between representative nodes through the charge graph.
    #[must_use]
    pub fn from_charge_graph_paths_for_sub_edges_of_atomic_errors(
        charge_graph: &ChargeGraph,
        atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
        rgb_reps: &[RgbEdge],
        node_colors: &[ColorBasis],
    ) -> Self {
        const MAX_COST: usize = 2;

        let mut decomposed_edges: BTreeSet<(NodeOffset, NodeOffset)> = BTreeSet::new();
        let mut searcher = BfsSearcher::new(node_colors.len());
        let mut drag_graph = DragGraph::default();

        let sorted = |a: NodeOffset, b: NodeOffset| if a <= b { (a, b) } else { (b, a) };

        let add_edge =
            |drag_graph: &mut DragGraph, n1, n2, c1, c2, flip: ObsMask| {
                drag_graph.moves.insert(ChargedEdge { n1, n2, c1, c2 }, flip);
                drag_graph.moves.insert(
                    ChargedEdge {
                        n1: n2,
                        n2: n1,
                        c1: c2,
                        c2: c1,
                    },
                    flip,
                );
            };

        let add_boundary_dumping_edge =
            |drag_graph: &mut DragGraph,
             searcher: &mut BfsSearcher,
             a: NodeOffset,
             b: NodeOffset,
             ab_obs_flip: ObsMask| {
                let rep = rgb_reps[a as usize];
                if rep.weight() != 3 {
                    return;
                }
                let ca = node_colors[a as usize].color;
                let cb = node_colors[b as usize].color;
                let c = ca ^ cb;
                if c == Charge::Neutral {
                    return;
                }
                let r1_flip = searcher.find_shortest_path_obs_flip(
                    charge_graph,
                    rep.color_node(ca),
                    a,
                    MAX_COST,
                );
                let r2_flip = searcher.find_shortest_path_obs_flip(
                    charge_graph,
                    rep.color_node(cb),
                    b,
                    MAX_COST,
                );
                if let (Some(r1), Some(r2)) = (r1_flip, r2_flip) {
                    let flip = r1 ^ r2 ^ rep.obs_flip ^ ab_obs_flip;
                    drag_graph.moves.insert(
                        ChargedEdge {
                            n1: a,
                            n2: b,
                            c1: c,
                            c2: Charge::Neutral,
                        },
                        flip,
                    );
                    drag_graph.moves.insert(
                        ChargedEdge {
                            n1: b,
                            n2: a,
                            c1: Charge::Neutral,
                            c2: c,
                        },
                        flip,
                    );
                }
            };

        for (err, &err_obs_flip) in atomic_errors {
            match err.weight() {
                3 => {
                    debug_assert_eq!(err.net_charge(node_colors), Charge::Neutral);
                    let [a, b, c] = err.dets;
                    decomposed_edges.insert(sorted(a, b));
                    decomposed_edges.insert(sorted(a, c));
                    decomposed_edges.insert(sorted(b, c));
                }
                2 => {
                    let a = err.dets[0];
                    let b = err.dets[1];
                    let ca = node_colors[a as usize].color;
                    let cb = node_colors[b as usize].color;
                    let p = charge_graph.nodes[a as usize].neighbors[&b];
                    // The pair error turns charge on one node into charge on
                    // the other node.
                    add_edge(&mut drag_graph, a, b, ca, cb, p);
                    add_edge(&mut drag_graph, a, b, Charge::Neutral, Charge::Neutral, 0);
                    // The pair error can also dump the third charge type, if
                    // it's nearby.
                    add_boundary_dumping_edge(&mut drag_graph, &mut searcher, a, b, err_obs_flip);
                    add_boundary_dumping_edge(&mut drag_graph, &mut searcher, b, a, err_obs_flip);
                    decomposed_edges.insert(sorted(a, b));
                }
                1 => {
                    let n = err.dets[0];
                    let c = node_colors[n as usize].color;

                    // Applying the corner error dumps (or restores) the
                    // node's charge.
                    add_edge(&mut drag_graph, n, n, c, Charge::Neutral, err_obs_flip);
                    add_edge(&mut drag_graph, n, n, Charge::Neutral, Charge::Neutral, 0);

                    // The corner error, plus the node's rep error, will flip
                    // between the other two nearby charges.
                    let r = rgb_reps[n as usize];
                    if r.weight() == 3 {
                        let f = r.obs_flip ^ err_obs_flip;
                        let c1 = c.next_non_neutral();
                        let c2 = c1.next_non_neutral();
                        add_edge(&mut drag_graph, n, n, c1, c2, f);
                    }
                }
                _ => {}
            }
        }

        for &(n1, n2) in &decomposed_edges {
            debug_assert!(n1 != BOUNDARY_NODE && n2 != BOUNDARY_NODE);
            let reps1 = rgb_reps[n1 as usize];
            let reps2 = rgb_reps[n2 as usize];
            for c in Charge::all_colors() {
                let r1 = reps1.color_node(c);
                let r2 = reps2.color_node(c);
                if r1 != BOUNDARY_NODE && r2 != BOUNDARY_NODE {
                    // Solve for how to drag charge type c from near n1 to
                    // near n2.
                    if let Some(res) =
                        searcher.find_shortest_path_obs_flip(charge_graph, r1, r2, MAX_COST)
                    {
                        add_edge(&mut drag_graph, n1, n2, c, c, res);
                    }
                }
            }
            // Can drag neutral charge around by doing nothing.
            add_edge(&mut drag_graph, n1, n2, Charge::Neutral, Charge::Neutral, 0);
        }

        drag_graph
    }
}

impl fmt::Display for DragGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DragGraph{{")?;
        for (k, v) in &self.moves {
            writeln!(f, "    {}@{}:{}@{} = {}", k.c1, k.n1, k.c2, k.n2, v)?;
        }
        write!(f, "}}")
    }
}
