//! Color charges, measurement bases, and the doubled (mobius) node mapping.
//!
//! # Charges
//!
//! Excitations in a color code carry one of three color charges (R, G, B) or
//! no charge. Charges form the group Z2 x Z2 under XOR:
//!
//! ```text
//! R ^ G = B      G ^ B = R      R ^ B = G      x ^ x = NEUTRAL
//! ```
//!
//! Encoding NEUTRAL=0, R=1, G=2, B=3 makes the group operation a plain
//! bitwise XOR on the discriminants.
//!
//! # Subgraphs
//!
//! The matching reduction projects the three-color problem onto the three
//! two-color subgraphs NotRed, NotGreen, NotBlue. A detector of color `c`
//! participates in exactly the two subgraphs that include `c`, so every
//! detector `d` doubles into mobius nodes `2d+0` and `2d+1`:
//!
//! | Color | Offset 0  | Offset 1 |
//! |-------|-----------|----------|
//! | R     | NotGreen  | NotBlue  |
//! | G     | NotRed    | NotBlue  |
//! | B     | NotRed    | NotGreen |

use std::fmt;
use std::ops::{BitXor, BitXorAssign};

/// Index of a detector node. [`BOUNDARY_NODE`] is reserved as a sentinel.
pub type NodeOffset = u32;

/// Sentinel node index representing the boundary (never a real detector).
pub const BOUNDARY_NODE: NodeOffset = NodeOffset::MAX;

/// Bitmask over logical observables. Bit `k` is observable `k`.
pub type ObsMask = u64;

/// A color charge, or the absence of one.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Charge {
    /// No charge.
    Neutral = 0,
    /// Red charge.
    R = 1,
    /// Green charge.
    G = 2,
    /// Blue charge.
    B = 3,
}

impl Charge {
    /// All three non-neutral charges, in cyclic order.
    #[must_use]
    pub const fn all_colors() -> [Charge; 3] {
        [Charge::R, Charge::G, Charge::B]
    }

    /// Reconstructs a charge from its discriminant.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `v > 3`.
    #[inline(always)]
    #[must_use]
    pub const fn from_u8(v: u8) -> Self {
        debug_assert!(v < 4);
        match v {
            0 => Charge::Neutral,
            1 => Charge::R,
            2 => Charge::G,
            _ => Charge::B,
        }
    }

    /// The next non-neutral charge in the cycle R -> G -> B -> R.
    ///
    /// Neutral maps to R.
    #[inline(always)]
    #[must_use]
    pub const fn next_non_neutral(self) -> Self {
        Self::from_u8(self as u8 % 3 + 1)
    }
}

impl Default for Charge {
    fn default() -> Self {
        Charge::Neutral
    }
}

impl BitXor for Charge {
    type Output = Charge;

    #[inline(always)]
    fn bitxor(self, rhs: Charge) -> Charge {
        Charge::from_u8(self as u8 ^ rhs as u8)
    }
}

impl BitXorAssign for Charge {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Charge) {
        *self = *self ^ rhs;
    }
}

impl fmt::Display for Charge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charge::Neutral => write!(f, "NEUTRAL"),
            Charge::R => write!(f, "R"),
            Charge::G => write!(f, "G"),
            Charge::B => write!(f, "B"),
        }
    }
}

/// The measurement basis of a detector.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Basis {
    /// Not yet known; only valid while loading annotations.
    Unknown = 0,
    /// X basis.
    X = 1,
    /// Z basis.
    Z = 2,
}

impl Default for Basis {
    fn default() -> Self {
        Basis::Unknown
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Unknown => write!(f, "UNKNOWN"),
            Basis::X => write!(f, "X"),
            Basis::Z => write!(f, "Z"),
        }
    }
}

/// One of the three two-color subgraphs of the matching reduction.
///
/// `NotRed` contains the green and blue detectors, and so on.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum SubGraphCoord {
    /// The green/blue subgraph.
    NotRed = 1,
    /// The red/blue subgraph.
    NotGreen = 2,
    /// The red/green subgraph.
    NotBlue = 3,
}

impl fmt::Display for SubGraphCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubGraphCoord::NotRed => write!(f, "NotRed"),
            SubGraphCoord::NotGreen => write!(f, "NotGreen"),
            SubGraphCoord::NotBlue => write!(f, "NotBlue"),
        }
    }
}

/// Doubling offset of a red detector's copy in the NotGreen subgraph.
pub const SUBGRAPH_OFFSET_RED_NOT_GREEN: u8 = 0;
/// Doubling offset of a red detector's copy in the NotBlue subgraph.
pub const SUBGRAPH_OFFSET_RED_NOT_BLUE: u8 = 1;
/// Doubling offset of a green detector's copy in the NotRed subgraph.
pub const SUBGRAPH_OFFSET_GREEN_NOT_RED: u8 = 0;
/// Doubling offset of a green detector's copy in the NotBlue subgraph.
pub const SUBGRAPH_OFFSET_GREEN_NOT_BLUE: u8 = 1;
/// Doubling offset of a blue detector's copy in the NotRed subgraph.
pub const SUBGRAPH_OFFSET_BLUE_NOT_RED: u8 = 0;
/// Doubling offset of a blue detector's copy in the NotGreen subgraph.
pub const SUBGRAPH_OFFSET_BLUE_NOT_GREEN: u8 = 1;

/// The color, basis, and ignored-flag of one detector.
///
/// `ignored` marks detectors whose 4th coordinate annotation was -1. They
/// take part in no decoding; any error symptom on them is dropped.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ColorBasis {
    /// The detector's color charge (Neutral only while ignored/unloaded).
    pub color: Charge,
    /// The detector's measurement basis.
    pub basis: Basis,
    /// True when the detector is excluded from decoding.
    pub ignored: bool,
}

impl ColorBasis {
    /// Creates an active (non-ignored) color/basis pair.
    #[must_use]
    pub const fn new(color: Charge, basis: Basis) -> Self {
        Self {
            color,
            basis,
            ignored: false,
        }
    }

    /// The color/basis value for an ignored detector.
    #[must_use]
    pub const fn new_ignored() -> Self {
        Self {
            color: Charge::Neutral,
            basis: Basis::Unknown,
            ignored: true,
        }
    }
}

impl fmt::Display for ColorBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color, self.basis)?;
        if self.ignored {
            write!(f, "(ignored)")?;
        }
        Ok(())
    }
}

/// Splits a mobius node index back into `(detector, color, subgraph)`.
#[must_use]
pub fn mobius_node_to_detector(
    mobius_node: u64,
    colors: &[ColorBasis],
) -> (NodeOffset, Charge, SubGraphCoord) {
    let n = (mobius_node >> 1) as NodeOffset;
    let mut g = (mobius_node & 1) as u8 + 1;
    let c = colors[n as usize].color;
    g += u8::from(g >= c as u8);
    let subgraph = match g {
        1 => SubGraphCoord::NotRed,
        2 => SubGraphCoord::NotGreen,
        _ => SubGraphCoord::NotBlue,
    };
    (n, c, subgraph)
}

/// Maps a detector into its copy in the given subgraph.
///
/// # Panics
///
/// Panics when the detector's color is excluded from `subgraph` (a detector
/// never appears in the subgraph that excludes its own color).
#[must_use]
pub fn detector_to_mobius_node(
    node: NodeOffset,
    subgraph: SubGraphCoord,
    colors: &[ColorBasis],
) -> u64 {
    let c = colors[node as usize].color;
    let offset = match (c, subgraph) {
        (Charge::R, SubGraphCoord::NotGreen) => SUBGRAPH_OFFSET_RED_NOT_GREEN,
        (Charge::R, SubGraphCoord::NotBlue) => SUBGRAPH_OFFSET_RED_NOT_BLUE,
        (Charge::G, SubGraphCoord::NotRed) => SUBGRAPH_OFFSET_GREEN_NOT_RED,
        (Charge::G, SubGraphCoord::NotBlue) => SUBGRAPH_OFFSET_GREEN_NOT_BLUE,
        (Charge::B, SubGraphCoord::NotRed) => SUBGRAPH_OFFSET_BLUE_NOT_RED,
        (Charge::B, SubGraphCoord::NotGreen) => SUBGRAPH_OFFSET_BLUE_NOT_GREEN,
        _ => panic!("detector D{} of color {} has no copy in {}", node, c, subgraph),
    };
    u64::from(node) * 2 + u64::from(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_xor_table() {
        use Charge::*;
        assert_eq!(R ^ G, B);
        assert_eq!(R ^ B, G);
        assert_eq!(G ^ B, R);
        for c in [Neutral, R, G, B] {
            assert_eq!(c ^ c, Neutral);
            assert_eq!(c ^ Neutral, c);
        }
    }

    #[test]
    fn charge_next_cycle() {
        assert_eq!(Charge::R.next_non_neutral(), Charge::G);
        assert_eq!(Charge::G.next_non_neutral(), Charge::B);
        assert_eq!(Charge::B.next_non_neutral(), Charge::R);
        assert_eq!(
            Charge::R.next_non_neutral().next_non_neutral().next_non_neutral(),
            Charge::R
        );
    }

    #[test]
    fn mobius_node_round_trip() {
        let colors = vec![
            ColorBasis::new(Charge::R, Basis::X),
            ColorBasis::new(Charge::G, Basis::X),
            ColorBasis::new(Charge::B, Basis::Z),
        ];
        for n in 0..colors.len() as NodeOffset {
            let c = colors[n as usize].color;
            for g in [
                SubGraphCoord::NotRed,
                SubGraphCoord::NotGreen,
                SubGraphCoord::NotBlue,
            ] {
                if g as u8 == c as u8 {
                    continue;
                }
                let mobius = detector_to_mobius_node(n, g, &colors);
                assert_eq!(mobius_node_to_detector(mobius, &colors), (n, c, g));
            }
        }
    }

    #[test]
    fn doubling_offsets_cover_both_halves() {
        let colors = vec![ColorBasis::new(Charge::G, Basis::Z)];
        let a = detector_to_mobius_node(0, SubGraphCoord::NotRed, &colors);
        let b = detector_to_mobius_node(0, SubGraphCoord::NotBlue, &colors);
        assert_eq!((a, b), (0, 1));
    }
}
