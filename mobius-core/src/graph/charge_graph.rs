//! The charge graph: atomic errors flattened into graphlike moves.
//!
//! Every edge is degree 1 or 2. Direct edges come from pair and singlet
//! atoms; synthetic edges come from pairs of overlapping atoms (at least one
//! a triplet) whose symptom multisets cancel down to one or two survivors.
//! The mask on an edge is the observable flip paid for using that move.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{AtomicErrorKey, NodeOffset, ObsMask, SparseXorVec, BOUNDARY_NODE};

/// Adjacency of one node in the charge graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChargeGraphNode {
    /// Neighbor -> observable flip of the connecting move. Contains a
    /// self-entry with mask 0, and possibly a [`BOUNDARY_NODE`] entry.
    pub neighbors: BTreeMap<NodeOffset, ObsMask>,
}

/// Graphlike view of the atomic error set, as an adjacency list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChargeGraph {
    /// One entry per detector.
    pub nodes: Vec<ChargeGraphNode>,
}

impl ChargeGraph {
    /// Inserts an undirected edge. Boundary endpoints get no adjacency entry.
    pub fn add_edge(&mut self, n1: NodeOffset, n2: NodeOffset, obs_flip: ObsMask) {
        if n1 != BOUNDARY_NODE {
            self.nodes[n1 as usize].neighbors.insert(n2, obs_flip);
        }
        if n2 != BOUNDARY_NODE {
            self.nodes[n2 as usize].neighbors.insert(n1, obs_flip);
        }
    }

    /// Builds the charge graph from the (remnant-merged) atomic error table.
    #[must_use]
    pub fn from_atomic_errors(
        atomic_errors: &BTreeMap<AtomicErrorKey, ObsMask>,
        num_nodes: usize,
    ) -> Self {
        let mut charge_graph = ChargeGraph {
            nodes: vec![ChargeGraphNode::default(); num_nodes],
        };
        for (k, node) in charge_graph.nodes.iter_mut().enumerate() {
            node.neighbors.insert(k as NodeOffset, 0);
        }

        // Add all directly included edges into the charge graph.
        for (err, &obs_flip) in atomic_errors {
            if err.dets[2] == BOUNDARY_NODE {
                charge_graph.add_edge(err.dets[0], err.dets[1], obs_flip);
            }
        }

        // Index errors by each node touched by the error.
        let mut node2neighbors: BTreeMap<NodeOffset, Vec<AtomicErrorKey>> = BTreeMap::new();
        for err in atomic_errors.keys() {
            for &n in &err.dets {
                if n != BOUNDARY_NODE {
                    node2neighbors.entry(n).or_default().push(*err);
                }
            }
        }

        // Form more graphlike edges by pairing overlapping errors.
        let mut xor_buf = SparseXorVec::new();
        for neighbors in node2neighbors.values() {
            for k1 in 0..neighbors.len() {
                for k2 in k1 + 1..neighbors.len() {
                    let e1 = &neighbors[k1];
                    let e2 = &neighbors[k2];
                    if e1.weight() < 3 && e2.weight() < 3 {
                        // These errors were already graphlike.
                        continue;
                    }

                    // Merge the errors.
                    xor_buf.clear();
                    for &d in e1.dets.iter().chain(&e2.dets) {
                        xor_buf.xor_item(d);
                    }

                    // Keep the merge only if it is itself graphlike.
                    let items = xor_buf.items();
                    let (a, b) = if items.len() == 1 {
                        (items[0], BOUNDARY_NODE)
                    } else if items.len() == 2
                        || (items.len() == 3 && items[2] == BOUNDARY_NODE)
                    {
                        (items[0], items[1])
                    } else {
                        continue;
                    };

                    charge_graph.add_edge(a, b, atomic_errors[e1] ^ atomic_errors[e2]);
                }
            }
        }

        charge_graph
    }
}

impl fmt::Display for ChargeGraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChargeGraphNode{{")?;
        for (k, (n, m)) in self.neighbors.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            if *n == BOUNDARY_NODE {
                write!(f, "BOUNDARY:{}", m)?;
            } else {
                write!(f, "{}:{}", n, m)?;
            }
        }
        write!(f, "}}")
    }
}

impl fmt::Display for ChargeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ChargeGraph{{")?;
        for (k, node) in self.nodes.iter().enumerate() {
            writeln!(f, "    {}, // node {}", node, k)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(entries: &[&[(NodeOffset, ObsMask)]]) -> ChargeGraph {
        ChargeGraph {
            nodes: entries
                .iter()
                .map(|ns| ChargeGraphNode {
                    neighbors: ns.iter().copied().collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_table_yields_self_loops() {
        let actual = ChargeGraph::from_atomic_errors(&BTreeMap::new(), 3);
        assert_eq!(
            actual,
            graph_of(&[&[(0, 0)], &[(1, 0)], &[(2, 0)]])
        );
    }

    #[test]
    fn singlet_becomes_boundary_edge() {
        let mut atomic = BTreeMap::new();
        atomic.insert(AtomicErrorKey::new(1, BOUNDARY_NODE, BOUNDARY_NODE), 0b1);
        let actual = ChargeGraph::from_atomic_errors(&atomic, 3);
        assert_eq!(
            actual,
            graph_of(&[&[(0, 0)], &[(1, 0), (BOUNDARY_NODE, 0b1)], &[(2, 0)]])
        );
    }

    #[test]
    fn pair_becomes_direct_edge() {
        let mut atomic = BTreeMap::new();
        atomic.insert(AtomicErrorKey::new(1, 2, BOUNDARY_NODE), 0b100);
        let actual = ChargeGraph::from_atomic_errors(&atomic, 3);
        assert_eq!(
            actual,
            graph_of(&[&[(0, 0)], &[(1, 0), (2, 0b100)], &[(1, 0b100), (2, 0)]])
        );
    }

    #[test]
    fn lone_triplet_adds_no_edges() {
        let mut atomic = BTreeMap::new();
        atomic.insert(AtomicErrorKey::new(0, 1, 2), 0b100);
        let actual = ChargeGraph::from_atomic_errors(&atomic, 3);
        assert_eq!(actual, graph_of(&[&[(0, 0)], &[(1, 0)], &[(2, 0)]]));
    }

    #[test]
    fn overlapping_triplets_cancel_into_synthetic_edge() {
        let mut atomic = BTreeMap::new();
        atomic.insert(AtomicErrorKey::new(0, 1, 2), 0b100);
        atomic.insert(AtomicErrorKey::new(1, 2, 3), 0b010);
        let actual = ChargeGraph::from_atomic_errors(&atomic, 4);
        assert_eq!(
            actual,
            graph_of(&[
                &[(0, 0), (3, 0b110)],
                &[(1, 0)],
                &[(2, 0)],
                &[(0, 0b110), (3, 0)],
            ])
        );
    }

    #[test]
    fn triplet_pair_overlap_cancels_to_boundary_edge() {
        // {0,1,2} ^ {1,2} = {0}: a synthetic boundary edge at node 0.
        let mut atomic = BTreeMap::new();
        atomic.insert(AtomicErrorKey::new(0, 1, 2), 0b01);
        atomic.insert(AtomicErrorKey::new(1, 2, BOUNDARY_NODE), 0b10);
        let actual = ChargeGraph::from_atomic_errors(&atomic, 3);
        assert_eq!(
            actual,
            graph_of(&[
                &[(0, 0), (BOUNDARY_NODE, 0b11)],
                &[(1, 0), (2, 0b10)],
                &[(1, 0b10), (2, 0)],
            ])
        );
    }
}
