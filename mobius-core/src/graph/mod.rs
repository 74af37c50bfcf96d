//! Configure-time graph construction: node coloring, atomic and composite
//! error collection, and the auxiliary charge/representative/drag/Euler
//! structures used to lift matchings.

mod atomic_errors;
mod charge_graph;
mod composite;
mod drag_graph;
mod euler;
mod nodes;
mod rgb_reps;

pub use atomic_errors::{collect_atomic_errors, extract_obs_and_dets_from_error_instruction};
pub use charge_graph::{ChargeGraph, ChargeGraphNode};
pub use composite::{
    collect_composite_errors_and_remnants_into_mobius_dem, decompose_dets_into_atoms,
    decompose_single_basis_dets_into_atoms,
};
pub use drag_graph::{ChargedEdge, DragGraph};
pub use euler::EulerTourGraph;
pub use nodes::collect_nodes_from_dem;
pub use rgb_reps::choose_rgb_reps_from_atomic_errors;
