//! Small algebraic datatypes shared by every decoding stage.

mod atomic;
mod charge;
mod rgb_edge;
mod xor_vec;

pub use atomic::{inplace_sort2, sort3, AtomicErrorKey};
pub use charge::{
    detector_to_mobius_node, mobius_node_to_detector, Basis, Charge, ColorBasis, NodeOffset,
    ObsMask, SubGraphCoord, BOUNDARY_NODE, SUBGRAPH_OFFSET_BLUE_NOT_GREEN,
    SUBGRAPH_OFFSET_BLUE_NOT_RED, SUBGRAPH_OFFSET_GREEN_NOT_BLUE, SUBGRAPH_OFFSET_GREEN_NOT_RED,
    SUBGRAPH_OFFSET_RED_NOT_BLUE, SUBGRAPH_OFFSET_RED_NOT_GREEN,
};
pub use rgb_edge::RgbEdge;
pub use xor_vec::{inplace_xor_sort, SparseXorVec};
