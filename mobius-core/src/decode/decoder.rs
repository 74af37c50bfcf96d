//! The decoder: configure-time pipeline and per-shot decoding.
//!
//! Configuration digests an annotated detector error model into immutable
//! structures (node colors, atomic table, mobius model, charge graph, rgb
//! representatives, drag graph, matcher). Decoding a shot expands detection
//! events onto the doubled graph, matches them, splits the matched edges into
//! Euler tours, and lifts each tour into an observable flip contribution.

use std::collections::BTreeMap;
use std::fmt;

use crate::dem::DetectorErrorModel;
use crate::error::{ConfigError, DecodeError};
use crate::graph::{
    collect_atomic_errors, collect_composite_errors_and_remnants_into_mobius_dem,
    collect_nodes_from_dem, ChargeGraph, ChargedEdge, DragGraph, EulerTourGraph,
};
use crate::graph::choose_rgb_reps_from_atomic_errors;
use crate::types::{
    AtomicErrorKey, Charge, ColorBasis, NodeOffset, ObsMask, RgbEdge,
};

use super::matcher::{BlossomMatcher, Matcher};

/// Configuration options for [`Decoder::from_dem`].
pub struct DecoderConfigOptions {
    /// Controls whether errors that required the introduction of a remnant
    /// atomic error in order to decompose are discarded. Defaults to true
    /// because that gives the best accuracy in the most cases.
    pub drop_mobius_errors_involving_remnant_errors: bool,

    /// When an error can't be understood in terms of atomic errors, decides
    /// whether that error is silently discarded instead of failing
    /// configuration.
    pub ignore_decomposition_failures: bool,

    /// Whether the mobius detector error model receives coordinate data.
    /// Useful when debugging or printing out the decoder's internals.
    pub include_coords_in_mobius_dem: bool,

    /// The matcher to use. Defaults to the fusion-blossom MWPM solver.
    pub matcher: Option<Box<dyn Matcher>>,
}

impl Default for DecoderConfigOptions {
    fn default() -> Self {
        Self {
            drop_mobius_errors_involving_remnant_errors: true,
            ignore_decomposition_failures: false,
            include_coords_in_mobius_dem: false,
            matcher: None,
        }
    }
}

impl DecoderConfigOptions {
    fn matcher_for(&self, mobius_dem: &DetectorErrorModel) -> Result<Box<dyn Matcher>, ConfigError> {
        match &self.matcher {
            Some(m) => m.configured_for_mobius_dem(mobius_dem),
            None => Ok(Box::new(BlossomMatcher::configured(mobius_dem)?)),
        }
    }
}

/// A configured color code decoder.
pub struct Decoder {
    /// The color and basis of each node in the graph.
    pub node_colors: Vec<ColorBasis>,
    /// The basic errors that more complex errors are decomposed into.
    pub atomic_errors: BTreeMap<AtomicErrorKey, ObsMask>,
    /// The doubled detector error model given to the matcher.
    pub mobius_dem: DetectorErrorModel,

    /// Graphlike moves between charges.
    pub charge_graph: ChargeGraph,
    /// Per-detector representative triangles.
    pub rgb_reps: Vec<RgbEdge>,
    /// Legal charge movements and their observable costs.
    pub drag_graph: DragGraph,

    /// The configured matcher used to decode the mobius problem.
    matcher: Box<dyn Matcher>,

    /// Ephemeral workspace for detection event data given to the matcher.
    sparse_det_buffer: Vec<u64>,
    /// Ephemeral workspace for the matcher's results.
    matcher_edge_buf: Vec<i64>,
    /// Ephemeral workspace for decomposing matcher results into cycles.
    euler_tour_solver: EulerTourGraph,
    /// Ephemeral workspace tracking which detection events have been resolved
    /// within one Euler cycle.
    resolved_detection_event_buffer: Vec<NodeOffset>,
}

impl Decoder {
    /// Creates a decoder for a DEM with annotated detector colors and bases.
    ///
    /// Every detector must carry a 4th coordinate identifying its basis and
    /// color: RedX=0, GreenX=1, BlueX=2, RedZ=3, GreenZ=4, BlueZ=5, or -1 to
    /// exclude the detector from decoding.
    pub fn from_dem(
        dem: &DetectorErrorModel,
        options: DecoderConfigOptions,
    ) -> Result<Decoder, ConfigError> {
        // Find the color of each detector, while optionally adding coordinate
        // data to the mobius dem.
        let mut mobius_dem = DetectorErrorModel::new();
        let node_colors = collect_nodes_from_dem(
            dem,
            if options.include_coords_in_mobius_dem {
                Some(&mut mobius_dem)
            } else {
                None
            },
        )?;

        // Find the basic building-block errors that errors decompose into.
        let mut atomic_errors = collect_atomic_errors(dem, &node_colors)?;

        // Decompose all errors into building blocks, adding them into the
        // mobius dem. Remnants discovered along the way are merged into the
        // atomic table before the lifting structures are built.
        let mut remnant_edges = BTreeMap::new();
        collect_composite_errors_and_remnants_into_mobius_dem(
            dem,
            &node_colors,
            &atomic_errors,
            options.drop_mobius_errors_involving_remnant_errors,
            options.ignore_decomposition_failures,
            &mut mobius_dem,
            &mut remnant_edges,
        )?;
        for (k, v) in remnant_edges {
            atomic_errors.entry(k).or_insert(v);
        }
        if !node_colors.is_empty()
            && (!options.include_coords_in_mobius_dem
                || mobius_dem.count_detectors() < node_colors.len() as u64 * 2)
        {
            // Ensure the number of detectors in the mobius dem is exact.
            mobius_dem
                .append_detector_instruction(vec![], node_colors.len() as u64 * 2 - 1);
        }

        // For each node, pick nearby representatives for holding charge.
        let rgb_reps = choose_rgb_reps_from_atomic_errors(&atomic_errors, &node_colors);

        // Find the basic ways of moving charge around the graph.
        let charge_graph = ChargeGraph::from_atomic_errors(&atomic_errors, node_colors.len());

        // Solve for how to drag charge while travelling from node to node.
        let drag_graph = DragGraph::from_charge_graph_paths_for_sub_edges_of_atomic_errors(
            &charge_graph,
            &atomic_errors,
            &rgb_reps,
            &node_colors,
        );

        // Prepare the matcher.
        let matcher = options.matcher_for(&mobius_dem)?;
        let euler_tour_solver = EulerTourGraph::new(node_colors.len() * 2);

        Ok(Decoder {
            node_colors,
            atomic_errors,
            mobius_dem,
            charge_graph,
            rgb_reps,
            drag_graph,
            matcher,
            sparse_det_buffer: Vec::new(),
            matcher_edge_buf: Vec::new(),
            euler_tour_solver,
            resolved_detection_event_buffer: Vec::new(),
        })
    }

    /// Verifies that every mobius error is split into pairs of detectors.
    pub fn check_invariants(&self) -> Result<(), ConfigError> {
        use crate::dem::{DemInstruction, DemTarget};
        for instruction in &self.mobius_dem.instructions {
            if let DemInstruction::Error { targets, .. } = instruction {
                let mut valid = targets.len() % 3 == 2;
                for (k, t) in targets.iter().enumerate() {
                    match k % 3 {
                        0 | 1 => valid &= matches!(t, DemTarget::Detector(_)),
                        _ => valid &= t.is_separator(),
                    }
                }
                if !valid {
                    return Err(ConfigError::DecompositionFailure(format!(
                        "A mobius dem error wasn't split into pairs of detectors: error{:?}",
                        targets
                    )));
                }
            }
        }
        Ok(())
    }

    /// Predicts the observables flipped by errors producing the given
    /// bit-packed detection events (little endian: byte `k` bit `b` is
    /// detector `8k + b`).
    pub fn decode_detection_events(
        &mut self,
        bit_packed_detection_events: &[u8],
    ) -> Result<ObsMask, DecodeError> {
        debug_assert!(
            bit_packed_detection_events.len() * 8 >= self.node_colors.len(),
            "detection event data must cover every detector"
        );

        // Derive and decode the mobius matching problem.
        self.sparse_det_buffer.clear();
        self.matcher_edge_buf.clear();
        detection_events_to_mobius_detection_events(
            bit_packed_detection_events,
            &self.node_colors,
            &mut self.sparse_det_buffer,
        );
        self.matcher
            .match_edges(&self.sparse_det_buffer, &mut self.matcher_edge_buf, None);

        // Lift the solution by decomposing it into disjoint Euler cycles and
        // solving each cycle.
        let Decoder {
            node_colors,
            rgb_reps,
            drag_graph,
            euler_tour_solver,
            resolved_detection_event_buffer,
            sparse_det_buffer,
            matcher_edge_buf,
            ..
        } = self;
        let mut solution: ObsMask = 0;
        euler_tour_solver.iter_euler_tours_of_interleaved_edge_list(
            matcher_edge_buf,
            sparse_det_buffer,
            &mut |cycle| {
                solution ^= discharge_cycle(
                    node_colors,
                    rgb_reps,
                    drag_graph,
                    bit_packed_detection_events,
                    cycle,
                    resolved_detection_event_buffer,
                )?;
                Ok(())
            },
        )?;

        Ok(solution)
    }
}

/// Expands bit-packed detection events into the doubled event list, ascending
/// detector order, bit within byte from LSB to MSB. Ignored detectors are
/// skipped.
fn detection_events_to_mobius_detection_events(
    bit_packed_detection_events: &[u8],
    node_colors: &[ColorBasis],
    out_mobius_detection_events: &mut Vec<u64>,
) {
    for (k, &byte) in bit_packed_detection_events.iter().enumerate() {
        let mut b = byte;
        let mut k2 = 0u64;
        while b != 0 {
            if b & 1 != 0 {
                let d = k as u64 * 8 + k2;
                if (d as usize) < node_colors.len() && !node_colors[d as usize].ignored {
                    out_mobius_detection_events.push(d * 2);
                    out_mobius_detection_events.push(d * 2 + 1);
                }
            }
            b >>= 1;
            k2 += 1;
        }
    }
}

#[inline]
fn has_detection_event(packed: &[u8], d: NodeOffset) -> bool {
    packed[(d >> 3) as usize] & (1 << (d & 7)) != 0
}

/// Walks one Euler cycle with a single fixed starting charge, tracking the
/// accumulated observable mask of each reachable charge state. Returns the
/// mask of the starting state if the tour closes, or None.
fn discharge_cycle_single_start_charge(
    node_colors: &[ColorBasis],
    rgb_reps: &[RgbEdge],
    drag_graph: &DragGraph,
    packed_detection_events: &[u8],
    cycle: &[NodeOffset],
    start_charge: Charge,
    used_buf: &mut Vec<NodeOffset>,
) -> Option<ObsMask> {
    used_buf.clear();
    let mut cur_states: [Option<ObsMask>; 4] = [None; 4];
    cur_states[start_charge as usize] = Some(0);
    let mut cur_loc: NodeOffset = match cycle.last() {
        Some(&v) => v >> 1,
        None => return Some(0),
    };

    for &v in cycle {
        let next_loc: NodeOffset = v >> 1;

        let has_event = has_detection_event(packed_detection_events, cur_loc);
        if next_loc == cur_loc && has_event && !used_buf.contains(&cur_loc) {
            // Pick up the detection event: the event's charge swaps with the
            // neutral state, and (when a full triangle is available) the two
            // other charges swap with each other at the triangle's cost.
            used_buf.push(cur_loc);
            let det_charge = node_colors[cur_loc as usize].color;
            let mut states_after_det: [Option<ObsMask>; 4] = [None; 4];
            states_after_det[det_charge as usize] = cur_states[Charge::Neutral as usize];
            states_after_det[Charge::Neutral as usize] = cur_states[det_charge as usize];
            let r = rgb_reps[cur_loc as usize];
            if r.weight() == 3 {
                let c1 = det_charge.next_non_neutral();
                let c2 = c1.next_non_neutral();
                if let Some(m) = cur_states[c1 as usize] {
                    states_after_det[c2 as usize] = Some(m ^ r.obs_flip);
                }
                if let Some(m) = cur_states[c2 as usize] {
                    states_after_det[c1 as usize] = Some(m ^ r.obs_flip);
                }
            }
            cur_states = states_after_det;
        } else {
            // Drag the current charge to near the new location, potentially
            // switching the charge type.
            let mut states_after_drag: [Option<ObsMask>; 4] = [None; 4];
            for cur_charge in 0..4u8 {
                if let Some(cur_obs_flip) = cur_states[cur_charge as usize] {
                    for next_charge in 0..4u8 {
                        let key = ChargedEdge {
                            n1: cur_loc,
                            n2: next_loc,
                            c1: Charge::from_u8(cur_charge),
                            c2: Charge::from_u8(next_charge),
                        };
                        if let Some(&f) = drag_graph.moves.get(&key) {
                            states_after_drag[next_charge as usize] = Some(cur_obs_flip ^ f);
                        }
                    }
                }
            }
            cur_states = states_after_drag;
        }
        cur_loc = next_loc;
    }

    cur_states[start_charge as usize]
}

/// Resolves one Euler cycle by trying every starting charge in turn.
fn discharge_cycle(
    node_colors: &[ColorBasis],
    rgb_reps: &[RgbEdge],
    drag_graph: &DragGraph,
    packed_detection_events: &[u8],
    cycle: &[NodeOffset],
    used_buf: &mut Vec<NodeOffset>,
) -> Result<ObsMask, DecodeError> {
    for c in 0..4u8 {
        if let Some(v) = discharge_cycle_single_start_charge(
            node_colors,
            rgb_reps,
            drag_graph,
            packed_detection_events,
            cycle,
            Charge::from_u8(c),
            used_buf,
        ) {
            return Ok(v);
        }
    }

    let mut msg = String::from(
        "Failed to lift a flattened edge cycle from the matcher into an explanation of the \
         detection events in the cycle.\n\
         This could be due to a coloring error in the model used to configure the decoder, \
         or a bug in the decoder.\n\
         The cycle: {",
    );
    for &e in cycle {
        let d = e >> 1;
        msg.push_str(&format!("\n    D{}[{}", d, node_colors[d as usize]));
        if has_detection_event(packed_detection_events, d) {
            msg.push_str(", triggered");
        }
        msg.push(']');
    }
    msg.push_str("\n}\nAll detection events in the shot: {");
    for k in 0..node_colors.len() as NodeOffset {
        if has_detection_event(packed_detection_events, k) {
            msg.push_str(&format!("\n    D{}[{}, triggered]", k, node_colors[k as usize]));
        }
    }
    msg.push_str("\n}");
    Err(DecodeError::LiftFailure(msg))
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Decoder{{\n")?;
        writeln!(f, ".charge_graph={}\n", self.charge_graph)?;
        writeln!(f, ".rgb_reps={{")?;
        for (k, rep) in self.rgb_reps.iter().enumerate() {
            writeln!(f, "    {} // rep {}", rep, k)?;
        }
        writeln!(f, "}}\n")?;
        writeln!(f, ".drag_graph={}\n", self.drag_graph)?;
        write!(f, ".mobius_dem={{\n{}}}", self.mobius_dem)
    }
}
