//! An error with at most one symptom of each color.

use std::fmt;

use super::charge::{Charge, NodeOffset, ObsMask, BOUNDARY_NODE};

/// A triangle of color nodes used to hold charge near a detector.
///
/// Any slot may be [`BOUNDARY_NODE`], meaning there is no nearby node of that
/// color. `charge_flip` is the XOR of the colors actually present (NEUTRAL
/// when the triangle is full).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct RgbEdge {
    /// The red slot.
    pub red_node: NodeOffset,
    /// The green slot.
    pub green_node: NodeOffset,
    /// The blue slot.
    pub blue_node: NodeOffset,
    /// Observable mask flipped by the underlying error.
    pub obs_flip: ObsMask,
    /// XOR of the colors present.
    pub charge_flip: Charge,
}

impl Default for RgbEdge {
    fn default() -> Self {
        Self {
            red_node: BOUNDARY_NODE,
            green_node: BOUNDARY_NODE,
            blue_node: BOUNDARY_NODE,
            obs_flip: 0,
            charge_flip: Charge::Neutral,
        }
    }
}

impl RgbEdge {
    /// The node slot for a color, or [`BOUNDARY_NODE`] for the neutral charge.
    #[inline]
    #[must_use]
    pub fn color_node(&self, c: Charge) -> NodeOffset {
        match c {
            Charge::Neutral => BOUNDARY_NODE,
            Charge::R => self.red_node,
            Charge::G => self.green_node,
            Charge::B => self.blue_node,
        }
    }

    /// Mutable access to the node slot for a color.
    ///
    /// # Panics
    ///
    /// Panics for [`Charge::Neutral`], which has no slot.
    #[inline]
    pub fn color_node_mut(&mut self, c: Charge) -> &mut NodeOffset {
        match c {
            Charge::Neutral => panic!("the neutral charge has no node slot"),
            Charge::R => &mut self.red_node,
            Charge::G => &mut self.green_node,
            Charge::B => &mut self.blue_node,
        }
    }

    /// Number of filled slots.
    #[inline]
    #[must_use]
    pub fn weight(&self) -> usize {
        usize::from(self.red_node != BOUNDARY_NODE)
            + usize::from(self.green_node != BOUNDARY_NODE)
            + usize::from(self.blue_node != BOUNDARY_NODE)
    }
}

impl fmt::Display for RgbEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = |n: NodeOffset| -> String {
            if n == BOUNDARY_NODE {
                "BOUNDARY".to_string()
            } else {
                n.to_string()
            }
        };
        write!(
            f,
            "RgbEdge{{red={}, green={}, blue={}, obs_flip={}, charge_flip={}}}",
            slot(self.red_node),
            slot(self.green_node),
            slot(self.blue_node),
            self.obs_flip,
            self.charge_flip,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_slots_round_trip() {
        let mut e = RgbEdge::default();
        assert_eq!(e.weight(), 0);
        *e.color_node_mut(Charge::G) = 7;
        assert_eq!(e.color_node(Charge::G), 7);
        assert_eq!(e.color_node(Charge::R), BOUNDARY_NODE);
        assert_eq!(e.color_node(Charge::Neutral), BOUNDARY_NODE);
        assert_eq!(e.weight(), 1);
    }
}
