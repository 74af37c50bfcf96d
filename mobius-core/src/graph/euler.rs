//! Decomposes the matched edge multiset into disjoint Euler cycles.
//!
//! The graph must only have even degree nodes (every matched edge pairs with
//! the bridge edge of its endpoints' detection events). It may have multiple
//! connected components; each component yields one Euler tour, found with
//! Hierholzer's algorithm: walk depth first until stuck (necessarily back at
//! the start), then rotate the cycle so a node with unused edges is at the
//! end and splice in its sub-cycle.

use crate::error::DecodeError;
use crate::types::{NodeOffset, BOUNDARY_NODE};

/// One stored half-edge. `back_index` points at the mirror half-edge in the
/// other endpoint's list; consuming an edge voids the mirror by overwriting
/// its node with [`BOUNDARY_NODE`].
#[derive(Clone, Copy, Debug)]
struct EulerTourNeighbor {
    node: NodeOffset,
    back_index: u32,
}

/// Per-node half-edge list plus a cursor over the not-yet-consumed entries.
#[derive(Clone, Debug, Default)]
struct EulerTourNode {
    neighbors: Vec<EulerTourNeighbor>,
    next_neighbor: usize,
}

impl EulerTourNode {
    /// Advances the cursor to the next unconsumed neighbor and returns its
    /// index, or `None` when the node is exhausted.
    fn look_next_neighbor(&mut self) -> Option<usize> {
        while self.next_neighbor < self.neighbors.len() {
            if self.neighbors[self.next_neighbor].node == BOUNDARY_NODE {
                self.next_neighbor += 1;
                continue;
            }
            return Some(self.next_neighbor);
        }
        None
    }
}

/// Reusable workspace for Euler tour decomposition.
#[derive(Clone, Debug, Default)]
pub struct EulerTourGraph {
    nodes: Vec<EulerTourNode>,
    cycle_buf: Vec<NodeOffset>,
    cycle_buf2: Vec<NodeOffset>,
}

impl EulerTourGraph {
    /// Creates a workspace for a graph over `num_nodes` nodes.
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        Self {
            nodes: vec![EulerTourNode::default(); num_nodes],
            cycle_buf: Vec::new(),
            cycle_buf2: Vec::new(),
        }
    }

    fn add_edge(&mut self, a: NodeOffset, b: NodeOffset) {
        let na = self.nodes[a as usize].neighbors.len() as u32;
        let nb = self.nodes[b as usize].neighbors.len() as u32 + u32::from(a == b);
        self.nodes[a as usize].neighbors.push(EulerTourNeighbor {
            node: b,
            back_index: nb,
        });
        self.nodes[b as usize].neighbors.push(EulerTourNeighbor {
            node: a,
            back_index: na,
        });
    }

    /// Deletes all edges and buffer contents.
    ///
    /// Takes time proportional to the number of nodes, not edges.
    pub fn hard_reset(&mut self) {
        for n in &mut self.nodes {
            n.neighbors.clear();
            n.next_neighbor = 0;
        }
        self.cycle_buf.clear();
        self.cycle_buf2.clear();
    }

    /// Extends `cycle_buf` depth-first until the walk gets stuck.
    fn extend_cycle_depth_first(&mut self) {
        loop {
            let cur = *self.cycle_buf.last().unwrap() as usize;
            let neighbor_k = match self.nodes[cur].look_next_neighbor() {
                Some(k) => k,
                None => return,
            };
            self.nodes[cur].next_neighbor += 1;
            let neighbor = self.nodes[cur].neighbors[neighbor_k];
            self.cycle_buf.push(neighbor.node);
            self.nodes[neighbor.node as usize].neighbors[neighbor.back_index as usize].node =
                BOUNDARY_NODE;
        }
    }

    /// Rotates the cycle so that a node with unconsumed edges sits at the
    /// end, ready for another depth-first extension. Returns false when the
    /// component is fully consumed.
    fn rotate_cycle_to_end_with_unfinished_node(&mut self) -> Result<bool, DecodeError> {
        if self.cycle_buf.last() != self.cycle_buf.first() {
            self.hard_reset();
            return Err(DecodeError::MalformedMatching(
                "Graph didn't decompose into Euler tours.".to_string(),
            ));
        }
        self.cycle_buf.pop();

        let mut cycle_k = 1usize;
        while cycle_k < self.cycle_buf.len() {
            let n = self.cycle_buf[cycle_k] as usize;
            if self.nodes[n].look_next_neighbor().is_some() {
                break;
            }
            cycle_k += 1;
        }
        if cycle_k < self.cycle_buf.len() {
            self.cycle_buf2.extend_from_slice(&self.cycle_buf[cycle_k..]);
            self.cycle_buf2.extend_from_slice(&self.cycle_buf[..cycle_k + 1]);
            std::mem::swap(&mut self.cycle_buf, &mut self.cycle_buf2);
            self.cycle_buf2.clear();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn burn_component_at<F>(&mut self, n: NodeOffset, callback: &mut F) -> Result<(), DecodeError>
    where
        F: FnMut(&[NodeOffset]) -> Result<(), DecodeError>,
    {
        if self.nodes[n as usize].look_next_neighbor().is_none() {
            return Ok(());
        }
        self.cycle_buf.push(n);
        loop {
            self.extend_cycle_depth_first();
            if !self.rotate_cycle_to_end_with_unfinished_node()? {
                break;
            }
        }
        debug_assert!(!self.cycle_buf.is_empty());
        let result = callback(&self.cycle_buf);
        self.cycle_buf.clear();
        if result.is_err() {
            self.hard_reset();
        }
        result
    }

    /// Decomposes the given edges into Euler tours, invoking `callback` once
    /// per tour.
    ///
    /// `interleaved_edge_list` alternates endpoints (each consecutive pair is
    /// one matched edge); `bridge_dets` likewise (each consecutive pair is
    /// one detection event's bridge edge). On success the workspace is left
    /// clean for the next shot; on failure it is hard reset.
    pub fn iter_euler_tours_of_interleaved_edge_list<F>(
        &mut self,
        interleaved_edge_list: &[i64],
        bridge_dets: &[u64],
        callback: &mut F,
    ) -> Result<(), DecodeError>
    where
        F: FnMut(&[NodeOffset]) -> Result<(), DecodeError>,
    {
        debug_assert!(interleaved_edge_list.len() % 2 == 0);
        for edge in interleaved_edge_list.chunks_exact(2) {
            debug_assert!(edge[0] >= 0 && edge[1] >= 0);
            self.add_edge(edge[0] as NodeOffset, edge[1] as NodeOffset);
        }
        for bridge in bridge_dets.chunks_exact(2) {
            self.add_edge(bridge[0] as NodeOffset, bridge[1] as NodeOffset);
        }
        for &n in interleaved_edge_list {
            self.burn_component_at(n as NodeOffset, callback)?;
        }
        for &n in interleaved_edge_list {
            let node = &mut self.nodes[n as usize];
            debug_assert_eq!(node.next_neighbor, node.neighbors.len());
            node.next_neighbor = 0;
            node.neighbors.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tours_of(
        g: &mut EulerTourGraph,
        edge_list: &[(NodeOffset, NodeOffset)],
    ) -> Result<Vec<Vec<NodeOffset>>, DecodeError> {
        let mut interleaved = Vec::new();
        for &(a, b) in edge_list {
            interleaved.push(i64::from(a));
            interleaved.push(i64::from(b));
        }
        let mut result: Vec<Vec<NodeOffset>> = Vec::new();
        g.iter_euler_tours_of_interleaved_edge_list(&interleaved, &[], &mut |cycle| {
            result.push(cycle.to_vec());
            Ok(())
        })?;
        Ok(result)
    }

    #[test]
    fn empty_graph_has_no_tours() {
        let mut g = EulerTourGraph::new(10);
        assert_eq!(tours_of(&mut g, &[]).unwrap(), Vec::<Vec<NodeOffset>>::new());
    }

    #[test]
    fn odd_degree_graph_is_rejected() {
        let mut g = EulerTourGraph::new(10);
        assert!(matches!(
            tours_of(&mut g, &[(1, 2)]),
            Err(DecodeError::MalformedMatching(_))
        ));
        // The failed run must not poison the next one.
        assert_eq!(
            tours_of(&mut g, &[(1, 2), (2, 1)]).unwrap(),
            vec![vec![1, 2]]
        );
    }

    #[test]
    fn single_cycle() {
        let mut g = EulerTourGraph::new(10);
        assert_eq!(
            tours_of(&mut g, &[(1, 2), (3, 1), (2, 3)]).unwrap(),
            vec![vec![1, 2, 3]]
        );
    }

    #[test]
    fn disjoint_components_yield_separate_tours() {
        let mut g = EulerTourGraph::new(10);
        assert_eq!(
            tours_of(&mut g, &[(1, 2), (4, 5), (2, 1), (5, 6), (6, 4)]).unwrap(),
            vec![vec![1, 2], vec![4, 5, 6]]
        );
    }

    #[test]
    fn figure_eight_splices_subcycles() {
        let mut g = EulerTourGraph::new(10);
        assert_eq!(
            tours_of(
                &mut g,
                &[
                    (1, 2),
                    (2, 1),
                    (2, 3),
                    (3, 2),
                    (3, 4),
                    (4, 3),
                    (2, 5),
                    (5, 2),
                ]
            )
            .unwrap(),
            vec![vec![3, 2, 5, 2, 1, 2, 3, 4]]
        );
    }

    #[test]
    fn bridge_edges_join_the_tours() {
        let mut g = EulerTourGraph::new(10);
        let mut result: Vec<Vec<NodeOffset>> = Vec::new();
        g.iter_euler_tours_of_interleaved_edge_list(&[0, 1], &[0, 1], &mut |cycle| {
            result.push(cycle.to_vec());
            Ok(())
        })
        .unwrap();
        assert_eq!(result, vec![vec![0, 1]]);
    }
}
